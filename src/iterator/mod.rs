//! Filename Iterator: produces the next `(image, target)` path pair under a
//! policy. `next()` is called concurrently from the provider's batch workers;
//! each variant serializes its own mutable state.

mod random;
mod sequential;
mod weighted;

pub use random::RandomIterator;
pub use sequential::SequentialIterator;
pub use weighted::WeightedRandomIterator;

use crate::error::PipelineError;
use crate::pair::FilenamePair;

/// Common contract for all iteration policies.
pub trait FilenameIterator: Send + Sync {
    /// Produces the next pair under this policy.
    fn next(&self) -> Result<FilenamePair, PipelineError>;

    /// Returns iteration to its initial state. Randomized policies re-seed
    /// from their originally supplied seed.
    fn reset(&self);

    /// Number of elements in the underlying container.
    fn count(&self) -> usize;
}

/// Fisher-Yates shuffle of `0..n` using the given RNG, producing an exact
/// permutation of `[0, n)`.
fn shuffled_keys(n: usize, rng: &mut impl rand::Rng) -> Vec<usize> {
    use rand::seq::SliceRandom;
    let mut keys: Vec<usize> = (0..n).collect();
    keys.shuffle(rng);
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn shuffled_keys_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut keys = shuffled_keys(50, &mut rng);
        keys.sort_unstable();
        assert_eq!(keys, (0..50).collect::<Vec<_>>());
    }
}
