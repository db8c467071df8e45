//! Unseeded constructors across the crate source a seed from the platform's
//! nondeterministic clock exactly once, rather than relying on implicit
//! process-wide randomness.

use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn nondeterministic_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
