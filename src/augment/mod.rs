//! Stochastic in-place mutation of an image/target pair. Each augmentor owns
//! a seeded RNG behind its own mutex; pixel work runs unlocked and
//! single-threaded within one call — the provider parallelizes across pairs,
//! not within a pair.

mod blur;
mod combined;
mod crop;
mod float_cast;
mod gamma;
mod hsv;
mod label_remap;
mod rotate;
mod subsample;
mod translation;
mod zoom;

pub use blur::BlurAugmentor;
pub use combined::CombinedAugmentor;
pub use crop::CropAugmentor;
pub use float_cast::FloatCastAugmentor;
pub use gamma::GammaAugmentor;
pub use hsv::{BrightnessAugmentor, HueAugmentor, SaturationAugmentor};
pub use label_remap::CityscapesLabelRemapAugmentor;
pub use rotate::RotateAugmentor;
pub use subsample::SubsampleAugmentor;
pub use translation::TranslationAugmentor;
pub use zoom::ZoomAugmentor;

use crate::error::PipelineError;
use crate::pair::ImageLabelPair;

/// Common contract for every augmentor: mutate the pair in place.
pub trait Augmentor: Send + Sync {
    fn augment(&self, pair: &mut ImageLabelPair) -> Result<(), PipelineError>;
}

pub(crate) mod sampling {
    //! Shared pixel-sampling helpers used by the geometric augmentors.

    /// Reflect-without-repeat boundary policy: `i' = |i|` for `i < 0`,
    /// `i' = 2*len - i - 1` for `i >= len`. Exact parity requirement from the
    /// augmentor this crate generalizes.
    pub fn reflect(i: i64, len: usize) -> usize {
        let len = len as i64;
        let mut i = i;
        // A single reflection suffices for the offsets this crate draws
        // (|offset| <= len), but loop defensively for larger inputs.
        while i < 0 || i >= len {
            if i < 0 {
                i = -i;
            } else if i >= len {
                i = 2 * len - i - 1;
            }
        }
        i as usize
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn reflect_matches_s4_policy() {
            // 2x2 grid, translation (1, 0) reads row -1 for output row 0.
            assert_eq!(reflect(-1, 2), 1);
            assert_eq!(reflect(0, 2), 0);
            assert_eq!(reflect(1, 2), 1);
            assert_eq!(reflect(2, 2), 1);
        }
    }
}
