use super::TargetLoader;
use crate::codec;
use crate::error::PipelineError;
use crate::matrix::LabelMatrix;

/// Decodes the file as single-channel 8-bit, unmodified.
#[derive(Debug, Default, Clone, Copy)]
pub struct LabelLoader;

impl LabelLoader {
    pub fn new() -> Self {
        Self
    }
}

impl TargetLoader for LabelLoader {
    fn load(&self, path: &str) -> Result<LabelMatrix, PipelineError> {
        let img = codec::decode_gray(path)?;
        let (width, height) = (img.width() as usize, img.height() as usize);
        Ok(LabelMatrix::new(img.into_raw(), height, width))
    }
}
