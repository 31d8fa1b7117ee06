//! Seeded random source and noise images.
//!
//! One [`Random`] handle is threaded through everything that needs
//! randomness, so a seed fixes the whole synthetic frame.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, Poisson};
use thiserror::Error;

use crate::image::{Image, Pixel};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RandomError {
    #[error("Poisson mean must be positive and finite, got {0}")]
    InvalidPoissonMean(f64),
    #[error("Gaussian sigma must be non-negative and finite, got {0}")]
    InvalidSigma(f64),
}

/// Seeded pseudo-random generator.
#[derive(Debug, Clone)]
pub struct Random {
    rng: ChaCha8Rng,
    seed: u64,
}

impl Random {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform deviate in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Uniform integer in `[0, n)`. Panics if `n == 0`.
    pub fn uniform_int(&mut self, n: u32) -> u32 {
        assert!(n > 0, "uniform_int needs a non-empty range");
        self.rng.random_range(0..n)
    }

    /// Poisson deviate with the given mean.
    pub fn poisson(&mut self, mean: f64) -> Result<f64, RandomError> {
        let dist = poisson(mean)?;
        Ok(dist.sample(&mut self.rng))
    }

    /// Gaussian deviate with zero mean and unit variance.
    pub fn gaussian(&mut self) -> f64 {
        self.rng.sample(rand_distr::StandardNormal)
    }
}

fn poisson(mean: f64) -> Result<Poisson<f64>, RandomError> {
    if !(mean > 0.0 && mean.is_finite()) {
        return Err(RandomError::InvalidPoissonMean(mean));
    }
    Poisson::new(mean).map_err(|_| RandomError::InvalidPoissonMean(mean))
}

/// Overwrite every pixel with an independent Poisson deviate of mean `mean`.
///
/// Pixels are drawn row by row so a seed gives the same image every run.
pub fn random_poisson_image<T: Pixel>(
    image: &mut Image<T>,
    rng: &mut Random,
    mean: f64,
) -> Result<(), RandomError> {
    let dist = poisson(mean)?;
    for v in image.array_mut().iter_mut() {
        *v = num_traits::cast(dist.sample(&mut rng.rng)).unwrap_or_default();
    }
    Ok(())
}

/// Overwrite every pixel with `mean + sigma * N(0, 1)`.
pub fn random_gaussian_image<T: Pixel>(
    image: &mut Image<T>,
    rng: &mut Random,
    mean: f64,
    sigma: f64,
) -> Result<(), RandomError> {
    let dist = Normal::new(mean, sigma).map_err(|_| RandomError::InvalidSigma(sigma))?;
    for v in image.array_mut().iter_mut() {
        *v = num_traits::cast(dist.sample(&mut rng.rng)).unwrap_or_default();
    }
    Ok(())
}
