use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::sampling::reflect;
use super::Augmentor;
use crate::error::PipelineError;
use crate::matrix::ImageMatrix;
use crate::pair::ImageLabelPair;
use crate::rng::nondeterministic_seed;

/// If `sigma_max <= 0`, a no-op. Otherwise draws `sigma ~ U(0, sigma_max)`,
/// picks an odd kernel width `3 * ceil(sigma)`, and Gaussian-blurs the image
/// plane only (separable convolution, reflect-without-repeat boundary).
pub struct BlurAugmentor {
    sigma_max: f64,
    rng: Mutex<StdRng>,
}

impl BlurAugmentor {
    pub fn new(sigma_max: f64, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(nondeterministic_seed);
        Self {
            sigma_max,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Augmentor for BlurAugmentor {
    fn augment(&self, pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
        if self.sigma_max <= 0.0 {
            return Ok(());
        }
        let sigma: f64 = {
            let mut rng = self.rng.lock().unwrap();
            rng.gen_range(0.0..self.sigma_max)
        };
        if sigma <= 0.0 {
            return Ok(());
        }

        let mut width = (3.0 * sigma.ceil()) as i64;
        if width % 2 == 0 {
            width += 1;
        }
        let radius = (width / 2) as i64;
        let kernel = gaussian_kernel(sigma, radius);

        let horizontal = convolve_rows(&pair.image, &kernel, radius);
        let blurred = convolve_cols(&horizontal, &kernel, radius);
        pair.image = blurred;
        Ok(())
    }
}

fn gaussian_kernel(sigma: f64, radius: i64) -> Vec<f32> {
    let two_sigma2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|i| (-((i * i) as f64) / two_sigma2).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|v| *v /= sum);
    kernel.into_iter().map(|v| v as f32).collect()
}

fn convolve_rows(image: &ImageMatrix, kernel: &[f32], radius: i64) -> ImageMatrix {
    let (h, w) = (image.height(), image.width());
    let mut out = ImageMatrix::zeros(h, w);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 3];
            for (k, &coeff) in kernel.iter().enumerate() {
                let dx = k as i64 - radius;
                let sx = reflect(x as i64 + dx, w);
                let px = image.get(y, sx);
                for c in 0..3 {
                    acc[c] += px[c] * coeff;
                }
            }
            out.set(y, x, acc);
        }
    }
    out
}

fn convolve_cols(image: &ImageMatrix, kernel: &[f32], radius: i64) -> ImageMatrix {
    let (h, w) = (image.height(), image.width());
    let mut out = ImageMatrix::zeros(h, w);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 3];
            for (k, &coeff) in kernel.iter().enumerate() {
                let dy = k as i64 - radius;
                let sy = reflect(y as i64 + dy, h);
                let px = image.get(sy, x);
                for c in 0..3 {
                    acc[c] += px[c] * coeff;
                }
            }
            out.set(y, x, acc);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::LabelMatrix;

    #[test]
    fn zero_sigma_max_is_noop() {
        let aug = BlurAugmentor::new(0.0, Some(1));
        let mut image = ImageMatrix::zeros(4, 4);
        image.set(1, 1, [0.7, 0.2, 0.1]);
        let before = image.clone();
        let mut pair = ImageLabelPair::new(image, LabelMatrix::filled(4, 4, 0));
        aug.augment(&mut pair).unwrap();
        assert_eq!(pair.image, before);
    }

    #[test]
    fn kernel_is_normalized() {
        let k = gaussian_kernel(1.0, 3);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn blur_preserves_dims_and_leaves_target_untouched() {
        let aug = BlurAugmentor::new(2.0, Some(9));
        let image = ImageMatrix::zeros(6, 6);
        let target = LabelMatrix::filled(6, 6, 7);
        let mut pair = ImageLabelPair::new(image, target.clone());
        aug.augment(&mut pair).unwrap();
        assert_eq!(pair.image.height(), 6);
        assert_eq!(pair.image.width(), 6);
        assert_eq!(pair.target, target);
    }
}
