//! Sequential ordinal generation
//!
//! Generates ordinals in order starting from `min`. When `max` is reached,
//! wraps back to `min`. The cursor lives inside the generator, so each worker
//! owning its own instance never contends with the others.

use super::Generator;

/// Sequential generator over the half-open range `[min, max)`
#[derive(Debug, Clone)]
pub struct SequentialGenerator {
    min: u64,
    max: u64,
    /// Next ordinal to hand out
    cursor: u64,
    last: u64,
}

impl SequentialGenerator {
    /// Create a new sequential generator
    ///
    /// An empty range (`max <= min`) yields `min` forever.
    pub fn new(min: u64, max: u64) -> Self {
        Self {
            min,
            max,
            cursor: min,
            last: min,
        }
    }

    /// Number of distinct ordinals produced before wrapping
    pub fn len(&self) -> u64 {
        self.max.saturating_sub(self.min)
    }

    /// Check if the range is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Generator<u64> for SequentialGenerator {
    fn next_value(&mut self) -> u64 {
        let value = self.cursor;

        // Increment for next call
        self.cursor += 1;

        // Wrap around if we exceed max
        if self.cursor >= self.max {
            self.cursor = self.min;
        }

        self.last = value;
        value
    }

    fn last_value(&self) -> u64 {
        self.last
    }
}
