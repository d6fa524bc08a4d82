//! Constant generator

use super::Generator;

/// Always yields the same value
#[derive(Debug, Clone, Copy)]
pub struct ConstantGenerator(pub u64);

impl Generator<u64> for ConstantGenerator {
    #[inline]
    fn next_value(&mut self) -> u64 {
        self.0
    }

    #[inline]
    fn last_value(&self) -> u64 {
        self.0
    }
}
