//! Noise sources for simulated measurements.
//!
//! The simulator never reaches for a global RNG. Tests inject
//! [`NoNoise`] or [`ConstantNoise`]; the binary uses a seeded
//! [`RandomNoise`] so runs are reproducible.

use rand::prelude::*;

/// Produces a perturbation within `[-amplitude, amplitude]`.
pub trait NoiseSource {
    fn sample(&mut self, amplitude: f64) -> f64;
}

/// Uniform noise from a seedable RNG.
#[derive(Debug, Clone)]
pub struct RandomNoise {
    rng: StdRng,
}

impl RandomNoise {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl NoiseSource for RandomNoise {
    fn sample(&mut self, amplitude: f64) -> f64 {
        // Also rejects NaN.
        if !(amplitude > 0.0) {
            return 0.0;
        }
        self.rng.gen_range(-amplitude..=amplitude)
    }
}

/// Always zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNoise;

impl NoiseSource for NoNoise {
    fn sample(&mut self, _amplitude: f64) -> f64 {
        0.0
    }
}

/// Fixed offset, clamped to the requested amplitude.
#[derive(Debug, Clone, Copy)]
pub struct ConstantNoise(pub f64);

impl NoiseSource for ConstantNoise {
    fn sample(&mut self, amplitude: f64) -> f64 {
        let a = amplitude.abs();
        self.0.clamp(-a, a)
    }
}

impl<N: NoiseSource + ?Sized> NoiseSource for &mut N {
    fn sample(&mut self, amplitude: f64) -> f64 {
        (**self).sample(amplitude)
    }
}
