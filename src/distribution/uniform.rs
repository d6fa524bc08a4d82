//! Uniform random distribution
//!
//! All values in `[min, max]` are equally likely.
//!
//! # Performance
//!
//! Uses the xoshiro256++ PRNG which is very fast and has good statistical
//! properties. This matters since key choice happens once per operation.
//!
//! # Example
//!
//! ```
//! use kvpulse::distribution::{Generator, uniform::UniformGenerator};
//!
//! let mut gen = UniformGenerator::new(0, 1023);
//!
//! for _ in 0..10 {
//!     let key = gen.next_value();
//!     assert!(key < 1024);
//! }
//! ```

use super::Generator;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Uniform random generator over an inclusive range
pub struct UniformGenerator {
    min: u64,
    max: u64,
    last: u64,
    rng: Xoshiro256PlusPlus,
}

impl UniformGenerator {
    /// Create a new uniform generator with random seed
    ///
    /// Bounds are inclusive. Swapped bounds are normalized.
    pub fn new(min: u64, max: u64) -> Self {
        Self::with_rng(min, max, Xoshiro256PlusPlus::from_entropy())
    }

    /// Create a new uniform generator with specific seed
    ///
    /// Useful for reproducible tests.
    pub fn with_seed(min: u64, max: u64, seed: u64) -> Self {
        Self::with_rng(min, max, Xoshiro256PlusPlus::seed_from_u64(seed))
    }

    fn with_rng(min: u64, max: u64, rng: Xoshiro256PlusPlus) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            max,
            last: min,
            rng,
        }
    }

    /// Inclusive lower bound
    pub fn min(&self) -> u64 {
        self.min
    }

    /// Inclusive upper bound
    pub fn max(&self) -> u64 {
        self.max
    }
}

impl Generator<u64> for UniformGenerator {
    #[inline(always)]
    fn next_value(&mut self) -> u64 {
        self.last = self.rng.gen_range(self.min..=self.max);
        self.last
    }

    #[inline]
    fn last_value(&self) -> u64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_generator_basic() {
        let mut gen = UniformGenerator::new(0, 999);

        for _ in 0..100 {
            assert!(gen.next_value() < 1000);
        }
    }

    #[test]
    fn test_uniform_generator_single_value() {
        let mut gen = UniformGenerator::new(42, 42);
        assert_eq!(gen.next_value(), 42);
        assert_eq!(gen.next_value(), 42);
    }

    #[test]
    fn test_uniform_generator_swapped_bounds() {
        let mut gen = UniformGenerator::with_seed(10, 5, 1);
        assert_eq!(gen.min(), 5);
        assert_eq!(gen.max(), 10);
        for _ in 0..100 {
            let v = gen.next_value();
            assert!((5..=10).contains(&v));
        }
    }

    #[test]
    fn test_uniform_generator_seeded() {
        let mut gen1 = UniformGenerator::with_seed(0, 1000, 12345);
        let mut gen2 = UniformGenerator::with_seed(0, 1000, 12345);

        // Same seed should produce same sequence
        for _ in 0..10 {
            assert_eq!(gen1.next_value(), gen2.next_value());
        }
    }

    #[test]
    fn test_uniform_generator_last_tracks_next() {
        let mut gen = UniformGenerator::with_seed(100, 200, 9);
        assert_eq!(gen.last_value(), 100);

        for _ in 0..50 {
            let v = gen.next_value();
            assert_eq!(gen.last_value(), v);
            assert_eq!(gen.last_value(), v); // idempotent
        }
    }

    #[test]
    fn test_uniform_generator_coverage() {
        let mut gen = UniformGenerator::with_seed(0, 99, 42);
        let mut buckets = vec![0u32; 10];

        for _ in 0..10000 {
            let v = gen.next_value();
            buckets[(v / 10) as usize] += 1;
        }

        // Each bucket should have roughly 1000 samples (10000 / 10)
        // Allow 20% deviation for randomness
        for count in buckets {
            assert!(count > 800 && count < 1200, "Bucket count {} outside expected range", count);
        }
    }
}
