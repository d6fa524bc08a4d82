//! Exponential distribution
//!
//! Biased towards the top of the domain: the highest ordinal is the most
//! likely, and the probability decays exponentially going down. Parameterized
//! the usual way for key-value benchmarks: `percentile` percent of draws fall
//! within the top `range` ordinals.

use super::Generator;
use crate::error::ConfigError;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Default percentile of draws falling inside `range`
pub const DEFAULT_PERCENTILE: f64 = 95.0;

/// Default `range` as a fraction of the domain size
pub const DEFAULT_FRAC: f64 = 0.8571428571;

/// Exponential generator over an inclusive range
pub struct ExponentialGenerator {
    min: u64,
    max: u64,
    exp: Exp<f64>,
    last: u64,
    rng: Xoshiro256PlusPlus,
}

impl ExponentialGenerator {
    /// Create an exponential generator over `[min, max]`
    ///
    /// `percentile` percent of draws land within the top `range` ordinals.
    pub fn new(min: u64, max: u64, percentile: f64, range: f64) -> Result<Self, ConfigError> {
        Self::with_options(min, max, percentile, range, None)
    }

    /// Create an exponential generator with an optional seed
    pub fn with_options(
        min: u64,
        max: u64,
        percentile: f64,
        range: f64,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        if !(percentile > 0.0 && percentile < 100.0) {
            return Err(ConfigError::invalid(
                "exponential_percentile",
                format!("must be in (0, 100), got {}", percentile),
            ));
        }
        if !(range.is_finite() && range > 0.0) {
            return Err(ConfigError::invalid(
                "exponential_frac",
                format!("range must be positive, got {}", range),
            ));
        }

        let gamma = -(1.0 - percentile / 100.0).ln() / range;
        let exp = Exp::new(gamma).map_err(|e| ConfigError::invalid("exponential_percentile", e.to_string()))?;
        let (min, max) = if min <= max { (min, max) } else { (max, min) };

        let rng = match seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        Ok(Self {
            min,
            max,
            exp,
            last: min,
            rng,
        })
    }
}

impl Generator<u64> for ExponentialGenerator {
    fn next_value(&mut self) -> u64 {
        let span = self.max - self.min;
        // Redraw the (rare) tail that falls outside the domain
        let distance = loop {
            let d = self.exp.sample(&mut self.rng);
            if d <= span as f64 {
                break d as u64;
            }
        };
        self.last = self.max - distance;
        self.last
    }

    fn last_value(&self) -> u64 {
        self.last
    }
}
