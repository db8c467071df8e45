use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};

use super::Augmentor;
use crate::error::PipelineError;
use crate::pair::ImageLabelPair;
use crate::rng::nondeterministic_seed;

fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta.abs() < f32::EPSILON {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max.abs() < f32::EPSILON { 0.0 } else { delta / max };
    let v = max;
    (h.rem_euclid(360.0), s, v)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let c = v * s;
    let h_prime = h / 60.0;
    let x = c * (1.0 - (h_prime.rem_euclid(2.0) - 1.0).abs());
    let (r1, g1, b1) = if (0.0..1.0).contains(&h_prime) {
        (c, x, 0.0)
    } else if (1.0..2.0).contains(&h_prime) {
        (x, c, 0.0)
    } else if (2.0..3.0).contains(&h_prime) {
        (0.0, c, x)
    } else if (3.0..4.0).contains(&h_prime) {
        (0.0, x, c)
    } else if (4.0..5.0).contains(&h_prime) {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };
    let m = v - c;
    [r1 + m, g1 + m, b1 + m]
}

fn sample_range(rng: &mut StdRng, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if (hi - lo).abs() < f64::EPSILON {
        lo
    } else {
        Uniform::new(lo, hi).sample(rng)
    }
}

/// Multiplies S by a random factor in `[a, b]` (clamped to `[0, 1]`).
/// Target untouched.
pub struct SaturationAugmentor {
    min: f64,
    max: f64,
    rng: Mutex<StdRng>,
}

impl SaturationAugmentor {
    pub fn new(min: f64, max: f64, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(nondeterministic_seed);
        Self {
            min,
            max,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Augmentor for SaturationAugmentor {
    fn augment(&self, pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
        let factor = {
            let mut rng = self.rng.lock().unwrap();
            sample_range(&mut rng, self.min, self.max) as f32
        };
        for px in 0..(pair.image.height() * pair.image.width()) {
            let (y, x) = (px / pair.image.width(), px % pair.image.width());
            let [r, g, b] = pair.image.get(y, x);
            let (h, s, v) = rgb_to_hsv(r, g, b);
            let s = (s * factor).clamp(0.0, 1.0);
            pair.image.set(y, x, hsv_to_rgb(h, s, v));
        }
        Ok(())
    }
}

/// Adds a random offset to H in `[a, b]`, wrapping modulo 360. Target
/// untouched.
pub struct HueAugmentor {
    min: f64,
    max: f64,
    rng: Mutex<StdRng>,
}

impl HueAugmentor {
    pub fn new(min: f64, max: f64, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(nondeterministic_seed);
        Self {
            min,
            max,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Augmentor for HueAugmentor {
    fn augment(&self, pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
        let offset = {
            let mut rng = self.rng.lock().unwrap();
            sample_range(&mut rng, self.min, self.max) as f32
        };
        for px in 0..(pair.image.height() * pair.image.width()) {
            let (y, x) = (px / pair.image.width(), px % pair.image.width());
            let [r, g, b] = pair.image.get(y, x);
            let (h, s, v) = rgb_to_hsv(r, g, b);
            let h = (h + offset).rem_euclid(360.0);
            pair.image.set(y, x, hsv_to_rgb(h, s, v));
        }
        Ok(())
    }
}

/// Adds an offset to each image channel in `[a, b]` (clamped to `[0, 1]`).
/// Target untouched.
pub struct BrightnessAugmentor {
    min: f64,
    max: f64,
    rng: Mutex<StdRng>,
}

impl BrightnessAugmentor {
    pub fn new(min: f64, max: f64, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(nondeterministic_seed);
        Self {
            min,
            max,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Augmentor for BrightnessAugmentor {
    fn augment(&self, pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
        let offset = {
            let mut rng = self.rng.lock().unwrap();
            sample_range(&mut rng, self.min, self.max) as f32
        };
        for v in pair.image.as_mut_slice().iter_mut() {
            *v = (*v + offset).clamp(0.0, 1.0);
        }
        Ok(())
    }
}
