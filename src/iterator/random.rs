use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{shuffled_keys, FilenameIterator};
use crate::error::PipelineError;
use crate::pair::FilenamePair;
use crate::rng::nondeterministic_seed;

struct State {
    rng: StdRng,
    keys: Vec<usize>,
    pos: usize,
}

/// Epoch-shuffle policy: hands out elements in a shuffled key order, and on
/// exhausting the keys, re-shuffles with its own RNG and restarts. `reset()`
/// re-seeds from the originally supplied seed, so a reset reproduces the
/// same sequence.
pub struct RandomIterator {
    files: Vec<FilenamePair>,
    seed: u64,
    state: Mutex<State>,
}

impl RandomIterator {
    pub fn new(files: Vec<FilenamePair>, seed: Option<u64>) -> Result<Self, PipelineError> {
        if files.is_empty() {
            return Err(PipelineError::Exhaustion(
                "random iterator has an empty file list".to_string(),
            ));
        }
        let seed = seed.unwrap_or_else(nondeterministic_seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let keys = shuffled_keys(files.len(), &mut rng);
        Ok(Self {
            files,
            seed,
            state: Mutex::new(State { rng, keys, pos: 0 }),
        })
    }
}

impl FilenameIterator for RandomIterator {
    fn next(&self) -> Result<FilenamePair, PipelineError> {
        let mut state = self.state.lock().unwrap();
        if state.pos >= state.keys.len() {
            state.keys = shuffled_keys(self.files.len(), &mut state.rng);
            state.pos = 0;
            log::debug!("random iterator exhausted epoch, reshuffled {} keys", self.files.len());
        }
        let idx = state.keys[state.pos];
        state.pos += 1;
        Ok(self.files[idx].clone())
    }

    fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.rng = StdRng::seed_from_u64(self.seed);
        state.keys = shuffled_keys(self.files.len(), &mut state.rng);
        state.pos = 0;
    }

    fn count(&self) -> usize {
        self.files.len()
    }
}
