use std::sync::Mutex;

use super::FilenameIterator;
use crate::error::PipelineError;
use crate::pair::FilenamePair;

/// Visits elements in declared order, wrapping to the beginning once the end
/// is reached. Epoch boundaries are the provider's concern
/// (`count() / batch_size`), not end-of-iterator.
pub struct SequentialIterator {
    files: Vec<FilenamePair>,
    cursor: Mutex<usize>,
}

impl SequentialIterator {
    pub fn new(files: Vec<FilenamePair>) -> Result<Self, PipelineError> {
        if files.is_empty() {
            return Err(PipelineError::Exhaustion(
                "sequential iterator has an empty file list".to_string(),
            ));
        }
        Ok(Self {
            files,
            cursor: Mutex::new(0),
        })
    }
}

impl FilenameIterator for SequentialIterator {
    fn next(&self) -> Result<FilenamePair, PipelineError> {
        let mut cursor = self.cursor.lock().unwrap();
        let idx = *cursor % self.files.len();
        *cursor += 1;
        Ok(self.files[idx].clone())
    }

    fn reset(&self) {
        *self.cursor.lock().unwrap() = 0;
    }

    fn count(&self) -> usize {
        self.files.len()
    }
}
