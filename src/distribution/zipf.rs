//! Zipfian distribution implementation
//!
//! A small number of items receive the majority of requests, which is how
//! real key-value traffic tends to look.
//!
//! # Characteristics
//!
//! - Power law: P(k) ∝ 1 / k^theta, rank 1 being the domain minimum
//! - Small theta (0.5): closer to uniform
//! - Large theta (1.5+): heavily skewed
//! - Default theta (0.99): the classic key-value benchmark setting
//!
//! # Hotspot
//!
//! A [`Hotspot`] carves the first `data_fraction` of the domain into a hot set
//! that receives `opn_fraction` of all draws. Inside each of the hot and cold
//! sets the zipfian shape is applied relative to the start of that set.
//!
//! # Performance
//!
//! Uses inverse transform sampling with a pre-computed CDF (binary search,
//! O(log N)). The CDF covers at most [`MAX_RANKS`] ranks; larger domains map
//! each rank onto an equal slice of the domain, so the skew shape does not
//! depend on the key-space size.
//!
//! # Example
//!
//! ```
//! use kvpulse::distribution::{Generator, zipf::ZipfianGenerator};
//!
//! let mut gen = ZipfianGenerator::new(0, 999, 0.99).unwrap();
//! let key = gen.next_value();
//! assert!(key < 1000);
//! ```

use super::Generator;
use crate::error::ConfigError;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Default skew exponent
pub const DEFAULT_THETA: f64 = 0.99;

/// Largest CDF table built for a single domain
pub const MAX_RANKS: u64 = 1_000_000;

/// Hot subset of the key space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// Fraction of the domain that is hot (0.0-1.0)
    pub data_fraction: f64,
    /// Fraction of draws that land in the hot set (0.0-1.0)
    pub opn_fraction: f64,
}

impl Hotspot {
    /// Reject fractions outside `[0, 1]`
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("hotspotdatafraction", self.data_fraction),
            ("hotspotopnfraction", self.opn_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(key, format!("must be in [0, 1], got {}", value)));
            }
        }
        Ok(())
    }
}

/// Pre-computed CDF over a fixed number of ranks
#[derive(Debug, Clone)]
struct ZipfTable {
    cdf: Vec<f64>,
}

impl ZipfTable {
    /// Compute CDF for `items` ranks (capped at [`MAX_RANKS`])
    fn new(items: u64, theta: f64) -> Self {
        let n = items.clamp(1, MAX_RANKS) as usize;

        // H(N,s) = sum of i^(-s) for i=1 to N
        let mut h_n_s = 0.0;
        for i in 1..=n {
            h_n_s += (i as f64).powf(-theta);
        }

        let mut cdf = Vec::with_capacity(n);
        let mut cumulative = 0.0;
        for i in 1..=n {
            cumulative += (i as f64).powf(-theta) / h_n_s;
            cdf.push(cumulative);
        }

        Self { cdf }
    }

    fn ranks(&self) -> u64 {
        self.cdf.len() as u64
    }

    /// Map a uniform `u` to an offset in `[0, items)`
    fn sample(&self, u: f64, items: u64, rng: &mut Xoshiro256PlusPlus) -> u64 {
        if items == 0 {
            return 0;
        }

        // First rank whose CDF reaches u
        let rank = self.cdf.partition_point(|&c| c < u) as u64;
        let rank = rank.min(self.ranks() - 1);

        let ranks = self.ranks();
        if items == ranks {
            return rank;
        }

        // Spread each rank over its slice of the domain
        let lo = (rank as u128 * items as u128 / ranks as u128) as u64;
        let hi = ((rank + 1) as u128 * items as u128 / ranks as u128) as u64;
        let offset = if hi > lo + 1 { rng.gen_range(lo..hi) } else { lo };
        offset.min(items - 1)
    }
}

#[derive(Debug, Clone)]
enum Regions {
    Single(ZipfTable),
    Hotspot {
        hot: ZipfTable,
        hot_items: u64,
        cold: Option<ZipfTable>,
        opn_fraction: f64,
    },
}

/// Zipfian generator over an inclusive range
pub struct ZipfianGenerator {
    min: u64,
    items: u64,
    theta: f64,
    regions: Regions,
    last: u64,
    rng: Xoshiro256PlusPlus,
}

impl ZipfianGenerator {
    /// Create a zipfian generator over `[min, max]` with random seed
    pub fn new(min: u64, max: u64, theta: f64) -> Result<Self, ConfigError> {
        Self::with_options(min, max, theta, None, None)
    }

    /// Create a zipfian generator with specific seed
    pub fn with_seed(min: u64, max: u64, theta: f64, seed: u64) -> Result<Self, ConfigError> {
        Self::with_options(min, max, theta, None, Some(seed))
    }

    /// Create a zipfian generator with an optional hotspot and seed
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when theta is not a positive finite number or
    /// the hotspot fractions fall outside `[0, 1]`.
    pub fn with_options(
        min: u64,
        max: u64,
        theta: f64,
        hotspot: Option<Hotspot>,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        if !theta.is_finite() || theta <= 0.0 {
            return Err(ConfigError::invalid(
                "zipfian_theta",
                format!("must be a positive number, got {}", theta),
            ));
        }
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let items = max - min + 1;

        let regions = match hotspot {
            None => Regions::Single(ZipfTable::new(items, theta)),
            Some(hotspot) => {
                hotspot.validate()?;
                let hot_items = ((items as f64 * hotspot.data_fraction) as u64).clamp(1, items);
                let cold_items = items - hot_items;
                Regions::Hotspot {
                    hot: ZipfTable::new(hot_items, theta),
                    hot_items,
                    cold: (cold_items > 0).then(|| ZipfTable::new(cold_items, theta)),
                    opn_fraction: hotspot.opn_fraction,
                }
            }
        };

        let rng = match seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        Ok(Self {
            min,
            items,
            theta,
            regions,
            last: min,
            rng,
        })
    }

    /// Skew exponent
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Number of items in the domain
    pub fn items(&self) -> u64 {
        self.items
    }

    /// Draw a zipfian offset in `[0, items)` for an arbitrary item count
    ///
    /// The skew shape of the configured domain is stretched or compressed onto
    /// `items`. Used by generators whose domain grows during a run. Hotspot
    /// settings are ignored here.
    pub fn sample_offset(&mut self, items: u64) -> u64 {
        let u: f64 = self.rng.gen();
        let table = match &self.regions {
            Regions::Single(table) => table,
            Regions::Hotspot { hot, .. } => hot,
        };
        table.sample(u, items, &mut self.rng)
    }
}

impl Generator<u64> for ZipfianGenerator {
    fn next_value(&mut self) -> u64 {
        let u: f64 = self.rng.gen();
        let offset = match &self.regions {
            Regions::Single(table) => table.sample(u, self.items, &mut self.rng),
            Regions::Hotspot {
                hot,
                hot_items,
                cold,
                opn_fraction,
            } => {
                let pick: f64 = self.rng.gen();
                match cold {
                    Some(cold) if pick >= *opn_fraction => {
                        hot_items + cold.sample(u, self.items - hot_items, &mut self.rng)
                    }
                    _ => hot.sample(u, *hot_items, &mut self.rng),
                }
            }
        };
        self.last = self.min + offset;
        self.last
    }

    fn last_value(&self) -> u64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::uniform::UniformGenerator;

    #[test]
    fn test_zipfian_generator_basic() {
        let mut gen = ZipfianGenerator::new(0, 999, 0.99).unwrap();

        for _ in 0..100 {
            let v = gen.next_value();
            assert!(v < 1000);
            assert_eq!(gen.last_value(), v);
        }
    }

    #[test]
    fn test_zipfian_generator_offset_domain() {
        let mut gen = ZipfianGenerator::with_seed(500, 599, 0.99, 3).unwrap();
        for _ in 0..1000 {
            let v = gen.next_value();
            assert!((500..=599).contains(&v));
        }
    }

    #[test]
    fn test_zipfian_generator_seeded() {
        let mut gen1 = ZipfianGenerator::with_seed(0, 999, 1.2, 12345).unwrap();
        let mut gen2 = ZipfianGenerator::with_seed(0, 999, 1.2, 12345).unwrap();

        for _ in 0..10 {
            assert_eq!(gen1.next_value(), gen2.next_value());
        }
    }

    #[test]
    fn test_zipfian_beats_uniform_on_first_item() {
        const DRAWS: usize = 200_000;
        let mut zipf = ZipfianGenerator::with_seed(0, 999, 0.99, 42).unwrap();
        let mut uniform = UniformGenerator::with_seed(0, 999, 42);

        let zipf_hits = (0..DRAWS).filter(|_| zipf.next_value() == 0).count();
        let uniform_hits = (0..DRAWS).filter(|_| uniform.next_value() == 0).count();

        assert!(
            zipf_hits > uniform_hits * 10,
            "zipf rank-1 hits {} should dwarf uniform hits {}",
            zipf_hits,
            uniform_hits
        );
    }

    #[test]
    fn test_zipfian_frequency_monotonic_in_rank() {
        let mut gen = ZipfianGenerator::with_seed(0, 999, 0.99, 7).unwrap();
        let mut counts = vec![0u64; 1000];
        for _ in 0..500_000 {
            counts[gen.next_value() as usize] += 1;
        }

        // Individual ranks in the tail are noisy; compare bucketed frequencies.
        let buckets: Vec<u64> = [0..1, 1..2, 2..4, 4..8, 8..16, 16..32, 32..64, 64..128, 128..256, 256..512]
            .into_iter()
            .map(|r| {
                let width = (r.end - r.start) as u64;
                counts[r].iter().sum::<u64>() / width
            })
            .collect();
        for pair in buckets.windows(2) {
            assert!(pair[0] > pair[1], "per-item frequency must fall with rank: {:?}", buckets);
        }
    }

    #[test]
    fn test_zipfian_skew_shape_independent_of_size() {
        // Share of draws landing in the first 10% of the domain
        fn head_share(max: u64) -> f64 {
            let mut gen = ZipfianGenerator::with_seed(0, max, 0.99, 11).unwrap();
            let head = (max + 1) / 10;
            let hits = (0..100_000).filter(|_| gen.next_value() < head).count();
            hits as f64 / 100_000.0
        }

        let small = head_share(9_999);
        let large = head_share(99_999_999);
        assert!(
            (small - large).abs() < 0.1,
            "head share should be similar: {} vs {}",
            small,
            large
        );
    }

    #[test]
    fn test_zipfian_hotspot_share() {
        let hotspot = Hotspot {
            data_fraction: 0.2,
            opn_fraction: 0.8,
        };
        let mut gen = ZipfianGenerator::with_options(0, 9999, 0.99, Some(hotspot), Some(5)).unwrap();

        let draws = 100_000;
        let hot = (0..draws).filter(|_| gen.next_value() < 2000).count();
        let share = hot as f64 / draws as f64;
        assert!((share - 0.8).abs() < 0.02, "hot share {} should be near 0.8", share);
    }

    #[test]
    fn test_zipfian_hotspot_everything_hot() {
        let hotspot = Hotspot {
            data_fraction: 1.0,
            opn_fraction: 0.5,
        };
        let mut gen = ZipfianGenerator::with_options(0, 99, 0.99, Some(hotspot), Some(5)).unwrap();
        for _ in 0..1000 {
            assert!(gen.next_value() < 100);
        }
    }

    #[test]
    fn test_zipfian_sample_offset_growing_domain() {
        let mut gen = ZipfianGenerator::with_seed(0, 99, 0.99, 1).unwrap();
        for items in [1u64, 50, 100, 5_000] {
            for _ in 0..200 {
                assert!(gen.sample_offset(items) < items);
            }
        }
        assert_eq!(gen.sample_offset(0), 0);
    }

    #[test]
    fn test_zipfian_invalid_theta() {
        assert!(ZipfianGenerator::new(0, 10, 0.0).is_err());
        assert!(ZipfianGenerator::new(0, 10, -1.0).is_err());
        assert!(ZipfianGenerator::new(0, 10, f64::NAN).is_err());
    }

    #[test]
    fn test_zipfian_invalid_hotspot() {
        let hotspot = Hotspot {
            data_fraction: 1.5,
            opn_fraction: 0.5,
        };
        let err = ZipfianGenerator::with_options(0, 10, 0.99, Some(hotspot), None)
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
