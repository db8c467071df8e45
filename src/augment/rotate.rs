use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Augmentor;
use crate::error::PipelineError;
use crate::matrix::{ImageMatrix, LabelMatrix, VOID_LABEL};
use crate::pair::ImageLabelPair;
use crate::rng::nondeterministic_seed;

/// Draws an angle in `U(-theta, theta)` degrees (negative draws add 360, so
/// the working angle is always in `[0, 360)`), builds the affine rotation
/// matrix around the image center, and warps the image with bilinear
/// sampling and the target with nearest-neighbor sampling. Out-of-bounds
/// reads use constant fill: `0.0` for the image, the void sentinel for the
/// target.
pub struct RotateAugmentor {
    max_angle_deg: f64,
    rng: Mutex<StdRng>,
}

impl RotateAugmentor {
    pub fn new(max_angle_deg: f64, seed: Option<u64>) -> Result<Self, PipelineError> {
        if max_angle_deg < 0.0 {
            return Err(PipelineError::Config(
                "rotation max angle must be >= 0".to_string(),
            ));
        }
        let seed = seed.unwrap_or_else(nondeterministic_seed);
        Ok(Self {
            max_angle_deg,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }
}

impl Augmentor for RotateAugmentor {
    fn augment(&self, pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
        if !pair.dims_match() {
            return Err(PipelineError::Invariant(
                "rotation requires image and target to share dimensions".to_string(),
            ));
        }
        let mut angle: f64 = {
            let mut rng = self.rng.lock().unwrap();
            rng.gen_range(-self.max_angle_deg..=self.max_angle_deg)
        };
        if angle < 0.0 {
            angle += 360.0;
        }
        let theta = angle.to_radians();
        let (sin_t, cos_t) = theta.sin_cos();

        let h = pair.image.height();
        let w = pair.image.width();
        let cx = (w as f64 - 1.0) / 2.0;
        let cy = (h as f64 - 1.0) / 2.0;

        let mut out_image = ImageMatrix::zeros(h, w);
        let mut out_target = LabelMatrix::filled(h, w, VOID_LABEL);

        for oy in 0..h {
            for ox in 0..w {
                // Backward mapping: rotate the output coordinate by -theta to
                // find where it came from in the source image.
                let dx = ox as f64 - cx;
                let dy = oy as f64 - cy;
                let sx = cos_t * dx + sin_t * dy + cx;
                let sy = -sin_t * dx + cos_t * dy + cy;

                out_image.set(oy, ox, bilinear_sample(&pair.image, sx, sy));
                if let Some(label) = nearest_sample(&pair.target, sx, sy) {
                    out_target.set(oy, ox, label);
                }
            }
        }

        pair.image = out_image;
        pair.target = out_target;
        Ok(())
    }
}

fn bilinear_sample(image: &ImageMatrix, x: f64, y: f64) -> [f32; 3] {
    let (h, w) = (image.height() as f64, image.width() as f64);
    if x < -1.0 || y < -1.0 || x > w || y > h {
        return [0.0, 0.0, 0.0];
    }
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = (x - x0) as f32;
    let fy = (y - y0) as f32;

    let sample = |xi: f64, yi: f64| -> [f32; 3] {
        if xi < 0.0 || yi < 0.0 || xi >= w || yi >= h {
            [0.0, 0.0, 0.0]
        } else {
            image.get(yi as usize, xi as usize)
        }
    };

    let p00 = sample(x0, y0);
    let p10 = sample(x0 + 1.0, y0);
    let p01 = sample(x0, y0 + 1.0);
    let p11 = sample(x0 + 1.0, y0 + 1.0);

    let mut out = [0.0f32; 3];
    for c in 0..3 {
        let top = p00[c] * (1.0 - fx) + p10[c] * fx;
        let bottom = p01[c] * (1.0 - fx) + p11[c] * fx;
        out[c] = top * (1.0 - fy) + bottom * fy;
    }
    out
}

fn nearest_sample(target: &LabelMatrix, x: f64, y: f64) -> Option<u8> {
    let (h, w) = (target.height() as f64, target.width() as f64);
    let xi = x.round();
    let yi = y.round();
    if xi < 0.0 || yi < 0.0 || xi >= w || yi >= h {
        None
    } else {
        Some(target.get(yi as usize, xi as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_angle() {
        assert!(RotateAugmentor::new(-1.0, Some(1)).is_err());
    }

    #[test]
    fn geometric_coherence_preserved() {
        let aug = RotateAugmentor::new(45.0, Some(3)).unwrap();
        let mut pair = ImageLabelPair::new(ImageMatrix::zeros(9, 9), LabelMatrix::filled(9, 9, 2));
        aug.augment(&mut pair).unwrap();
        assert_eq!(pair.image.height(), 9);
        assert_eq!(pair.image.width(), 9);
        assert_eq!(pair.target.height(), 9);
        assert_eq!(pair.target.width(), 9);
    }

    #[test]
    fn zero_angle_is_near_identity_at_center() {
        let aug = RotateAugmentor::new(0.0, Some(3)).unwrap();
        let mut image = ImageMatrix::zeros(5, 5);
        image.set(2, 2, [0.5, 0.5, 0.5]);
        let mut pair = ImageLabelPair::new(image, LabelMatrix::filled(5, 5, 1));
        aug.augment(&mut pair).unwrap();
        assert_eq!(pair.image.get(2, 2), [0.5, 0.5, 0.5]);
    }
}
