use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Augmentor;
use crate::error::PipelineError;
use crate::pair::ImageLabelPair;
use crate::rng::nondeterministic_seed;

/// `a in [0, 0.5]`. Draws `gamma ~ U(-min(a,0.5), min(a,0.5))`, transforms
/// `gamma' = log(0.5 + gamma/sqrt(2)) / log(0.5 - gamma/sqrt(2))`, then raises
/// every image channel to the power `gamma'`. Label plane untouched.
pub struct GammaAugmentor {
    strength: f64,
    rng: Mutex<StdRng>,
}

impl GammaAugmentor {
    pub fn new(strength: f64, seed: Option<u64>) -> Result<Self, PipelineError> {
        if !(0.0..=0.5).contains(&strength) {
            return Err(PipelineError::Config(
                "gamma strength must lie in [0, 0.5]".to_string(),
            ));
        }
        let seed = seed.unwrap_or_else(nondeterministic_seed);
        Ok(Self {
            strength,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }
}

impl Augmentor for GammaAugmentor {
    fn augment(&self, pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
        let bound = self.strength.min(0.5);
        let gamma: f64 = {
            let mut rng = self.rng.lock().unwrap();
            if bound == 0.0 {
                0.0
            } else {
                rng.gen_range(-bound..bound)
            }
        };
        let gamma_prime = ((0.5 + gamma / std::f64::consts::SQRT_2).ln()
            / (0.5 - gamma / std::f64::consts::SQRT_2).ln()) as f32;

        for v in pair.image.as_mut_slice().iter_mut() {
            *v = v.clamp(0.0, 1.0).powf(gamma_prime);
        }
        Ok(())
    }
}
