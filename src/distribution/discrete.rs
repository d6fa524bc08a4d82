//! Weighted discrete choice
//!
//! Picks one of a fixed set of values with probability proportional to its
//! weight. This drives the operation mix of a run.

use super::Generator;
use crate::error::ConfigError;
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Discrete generator over `(value, weight)` pairs
pub struct DiscreteGenerator<T> {
    /// Values with a positive weight, in input order
    values: Vec<T>,
    index: WeightedIndex<f64>,
    last: T,
    rng: Xoshiro256PlusPlus,
}

impl<T: Copy + Send> DiscreteGenerator<T> {
    /// Create a discrete generator with random seed
    ///
    /// Weights need not sum to one; they are normalized.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyDiscrete`] if no weight is positive.
    pub fn new(weighted: &[(T, f64)]) -> Result<Self, ConfigError> {
        Self::with_rng(weighted, Xoshiro256PlusPlus::from_entropy())
    }

    /// Create a discrete generator with specific seed
    pub fn with_seed(weighted: &[(T, f64)], seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(weighted, Xoshiro256PlusPlus::seed_from_u64(seed))
    }

    fn with_rng(weighted: &[(T, f64)], rng: Xoshiro256PlusPlus) -> Result<Self, ConfigError> {
        let (values, weights): (Vec<T>, Vec<f64>) = weighted
            .iter()
            .copied()
            .filter(|&(_, weight)| weight.is_finite() && weight > 0.0)
            .unzip();

        let index = WeightedIndex::new(&weights).map_err(|_| ConfigError::EmptyDiscrete)?;
        let last = *values.first().ok_or(ConfigError::EmptyDiscrete)?;

        Ok(Self {
            values,
            index,
            last,
            rng,
        })
    }
}

impl<T: Copy + Send> Generator<T> for DiscreteGenerator<T> {
    fn next_value(&mut self) -> T {
        self.last = self.values[self.index.sample(&mut self.rng)];
        self.last
    }

    fn last_value(&self) -> T {
        self.last
    }
}
