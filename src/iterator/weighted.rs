use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::FilenameIterator;
use crate::error::PipelineError;
use crate::pair::FilenamePair;
use crate::rng::nondeterministic_seed;

/// Independent per-call sampling from a normalized-weight distribution via
/// inverse-CDF lookup. Negative weights fold to their absolute value before
/// normalization; all-zero weights are a fatal configuration error.
///
/// Cumulative-distribution lookups use strictly half-open intervals
/// `[c_{k-1}, c_k)`; a draw landing on (or past) the last boundary due to
/// rounding returns the last element.
pub struct WeightedRandomIterator {
    files: Vec<FilenamePair>,
    seed: u64,
    cumulative: Vec<f64>,
    rng: Mutex<StdRng>,
}

impl WeightedRandomIterator {
    pub fn new(
        files: Vec<FilenamePair>,
        weights: Vec<f64>,
        seed: Option<u64>,
    ) -> Result<Self, PipelineError> {
        if files.is_empty() {
            return Err(PipelineError::Exhaustion(
                "weighted random iterator has an empty file list".to_string(),
            ));
        }
        if files.len() != weights.len() {
            return Err(PipelineError::Config(format!(
                "{} files but {} weights",
                files.len(),
                weights.len()
            )));
        }
        let abs: Vec<f64> = weights.iter().map(|w| w.abs()).collect();
        let sum: f64 = abs.iter().sum();
        if sum <= 0.0 {
            return Err(PipelineError::Config(
                "weights are all zero after folding negatives to their absolute value".to_string(),
            ));
        }
        let mut acc = 0.0;
        let cumulative: Vec<f64> = abs
            .iter()
            .map(|w| {
                acc += w / sum;
                acc
            })
            .collect();

        let seed = seed.unwrap_or_else(nondeterministic_seed);
        Ok(Self {
            files,
            seed,
            cumulative,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }

    fn sample_index(&self, u: f64) -> usize {
        // Half-open bins [c_{k-1}, c_k): the bin containing `u` is the first
        // one whose upper boundary exceeds `u`, so a draw landing exactly on
        // an interior boundary lands in the upper bin, not the lower one.
        let idx = self.cumulative.partition_point(|&c| c <= u);
        idx.min(self.cumulative.len() - 1)
    }
}

impl FilenameIterator for WeightedRandomIterator {
    fn next(&self) -> Result<FilenamePair, PipelineError> {
        let u: f64 = {
            let mut rng = self.rng.lock().unwrap();
            rng.gen_range(0.0..1.0)
        };
        let idx = self.sample_index(u);
        Ok(self.files[idx].clone())
    }

    fn reset(&self) {
        *self.rng.lock().unwrap() = StdRng::seed_from_u64(self.seed);
    }

    fn count(&self) -> usize {
        self.files.len()
    }
}
