use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::sampling::reflect;
use super::Augmentor;
use crate::error::PipelineError;
use crate::matrix::{ImageMatrix, LabelMatrix, VOID_LABEL};
use crate::pair::ImageLabelPair;
use crate::rng::nondeterministic_seed;

/// Draws an integer `(tx, ty) ~ U{-d, ..., d}^2` and shifts both planes.
/// Out-of-bounds image reads use reflect-without-repeat; out-of-bounds target
/// reads become the void sentinel. Requires image and target to share
/// dimensions.
pub struct TranslationAugmentor {
    offset: i64,
    rng: Mutex<StdRng>,
}

impl TranslationAugmentor {
    pub fn new(offset: i64, seed: Option<u64>) -> Result<Self, PipelineError> {
        if offset < 0 {
            return Err(PipelineError::Config(
                "translation offset must be >= 0".to_string(),
            ));
        }
        let seed = seed.unwrap_or_else(nondeterministic_seed);
        Ok(Self {
            offset,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }
}

impl Augmentor for TranslationAugmentor {
    fn augment(&self, pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
        if !pair.dims_match() {
            return Err(PipelineError::Invariant(
                "translation requires image and target to share dimensions".to_string(),
            ));
        }
        let (tx, ty) = {
            let mut rng = self.rng.lock().unwrap();
            let d = self.offset;
            (rng.gen_range(-d..=d), rng.gen_range(-d..=d))
        };

        let h = pair.image.height();
        let w = pair.image.width();
        let mut out_image = ImageMatrix::zeros(h, w);
        let mut out_target = LabelMatrix::filled(h, w, VOID_LABEL);

        for i in 0..h {
            let src_i = i as i64 + ty;
            let image_src_i = reflect(src_i, h);
            let target_in_bounds_i = src_i >= 0 && (src_i as usize) < h;
            for j in 0..w {
                let src_j = j as i64 + tx;
                let image_src_j = reflect(src_j, w);
                out_image.set(i, j, pair.image.get(image_src_i, image_src_j));

                let target_in_bounds = target_in_bounds_i && src_j >= 0 && (src_j as usize) < w;
                if target_in_bounds {
                    out_target.set(i, j, pair.target.get(src_i as usize, src_j as usize));
                }
            }
        }

        pair.image = out_image;
        pair.target = out_target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_offset() {
        assert!(TranslationAugmentor::new(-1, Some(1)).is_err());
    }

    #[test]
    fn rejects_mismatched_dims() {
        let aug = TranslationAugmentor::new(1, Some(1)).unwrap();
        let mut pair = ImageLabelPair::new(ImageMatrix::zeros(4, 4), LabelMatrix::filled(2, 2, 0));
        assert!(aug.augment(&mut pair).is_err());
    }

    /// Searches seeds until one draws the given `(tx, ty)` pair from the
    /// same `gen_range(-d..=d)` sequence `TranslationAugmentor::augment`
    /// uses, so a test can drive the real method to a specific offset
    /// instead of duplicating its body.
    fn find_seed_for_offset(d: i64, wanted: (i64, i64)) -> u64 {
        for seed in 0..10_000u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let draw = (rng.gen_range(-d..=d), rng.gen_range(-d..=d));
            if draw == wanted {
                return seed;
            }
        }
        panic!("no seed found producing offset {wanted:?} within search bound");
    }

    #[test]
    fn s4_translation_oob_matches_spec() {
        let seed = find_seed_for_offset(1, (0, 1));
        let aug = TranslationAugmentor::new(1, Some(seed)).unwrap();

        let mut image = ImageMatrix::zeros(2, 2);
        image.set(0, 0, [0.1, 0.0, 0.0]);
        image.set(0, 1, [0.2, 0.0, 0.0]);
        image.set(1, 0, [0.3, 0.0, 0.0]);
        image.set(1, 1, [0.4, 0.0, 0.0]);
        let target = LabelMatrix::new(vec![10, 20, 30, 40], 2, 2);
        let mut pair = ImageLabelPair::new(image, target);

        aug.augment(&mut pair).unwrap();

        assert_eq!(pair.target.get(0, 0), VOID_LABEL);
        assert_eq!(pair.target.get(0, 1), VOID_LABEL);
        assert_eq!(pair.target.get(1, 0), 10);
        assert_eq!(pair.target.get(1, 1), 20);
        // Image plane reflects row -1 without repeating the edge: row 0
        // reads from row 1.
        assert_eq!(pair.image.get(0, 0), [0.3, 0.0, 0.0]);
        assert_eq!(pair.image.get(0, 1), [0.4, 0.0, 0.0]);
    }
}
