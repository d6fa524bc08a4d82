//! Skewed-latest distribution
//!
//! Favors the most recently inserted records: draws a zipfian distance back
//! from the newest ordinal of a shared [`CounterGenerator`]. The workload
//! engine hands in the counter of acknowledged records, which only advances
//! once the backend accepted an insert, so the hot end of the domain is always
//! a record that exists.

use super::counter::CounterGenerator;
use super::zipf::ZipfianGenerator;
use super::Generator;
use crate::error::ConfigError;

/// Zipfian distance back from the latest inserted ordinal
pub struct LatestGenerator {
    counter: CounterGenerator,
    /// Lowest ordinal of the domain
    base: u64,
    zipf: ZipfianGenerator,
    last: u64,
}

impl LatestGenerator {
    /// Create a generator over `[base, counter.current())`
    ///
    /// The counter is only read; whoever owns it advances it.
    ///
    /// `initial_items` sizes the zipfian table; the shape stretches as the
    /// counter moves past it.
    pub fn new(
        counter: CounterGenerator,
        base: u64,
        initial_items: u64,
        theta: f64,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let zipf = ZipfianGenerator::with_options(0, initial_items.max(1) - 1, theta, None, seed)?;
        Ok(Self {
            counter,
            base,
            zipf,
            last: base,
        })
    }
}

impl Generator<u64> for LatestGenerator {
    fn next_value(&mut self) -> u64 {
        let items = self.counter.current().saturating_sub(self.base);
        if items == 0 {
            self.last = self.base;
            return self.last;
        }
        let newest = self.base + items - 1;
        self.last = newest - self.zipf.sample_offset(items);
        self.last
    }

    fn last_value(&self) -> u64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_follows_counter() {
        let mut counter = CounterGenerator::new(0);
        for _ in 0..1000 {
            counter.next_value();
        }

        let mut gen = LatestGenerator::new(counter.clone(), 0, 1000, 0.99, Some(4)).unwrap();
        let draws = 20_000;
        let mut recent = 0;
        for _ in 0..draws {
            let v = gen.next_value();
            assert!(v < 1000);
            if v >= 900 {
                recent += 1;
            }
        }
        // Newest 10% must be hit far more often than 10% of the time
        assert!(recent as f64 / draws as f64 > 0.5);

        // Domain grows with the counter
        for _ in 0..1000 {
            counter.next_value();
        }
        let max = (0..5000).map(|_| gen.next_value()).max().unwrap();
        assert!(max >= 1000 && max < 2000);
    }

    #[test]
    fn test_latest_newest_is_hottest() {
        let counter = CounterGenerator::new(500);
        let mut gen = LatestGenerator::new(counter.clone(), 0, 500, 0.99, Some(11)).unwrap();

        let mut hits = vec![0u32; 501];
        for _ in 0..20_000 {
            hits[gen.next_value() as usize] += 1;
        }
        let hottest = (0..hits.len()).max_by_key(|&i| hits[i]).unwrap();
        assert_eq!(hottest, 499);
        assert_eq!(hits[500], 0);

        // Advancing the shared counter moves the hot end with it
        counter.increment();
        let mut hits = vec![0u32; 501];
        for _ in 0..20_000 {
            hits[gen.next_value() as usize] += 1;
        }
        let hottest = (0..hits.len()).max_by_key(|&i| hits[i]).unwrap();
        assert_eq!(hottest, 500);
    }

    #[test]
    fn test_latest_empty_counter() {
        let counter = CounterGenerator::new(7);
        let mut gen = LatestGenerator::new(counter, 7, 10, 0.99, Some(1)).unwrap();
        assert_eq!(gen.next_value(), 7);
        assert_eq!(gen.last_value(), 7);
    }

    #[test]
    fn test_latest_spans_preloaded_records() {
        // Run-phase counter starts after 100 loaded records
        let counter = CounterGenerator::new(100);
        let mut gen = LatestGenerator::new(counter, 0, 100, 0.99, Some(2)).unwrap();
        for _ in 0..1000 {
            assert!(gen.next_value() < 100);
        }
    }
}
