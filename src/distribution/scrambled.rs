//! Hash scrambling
//!
//! Spreads the output of another generator across a domain so that popular
//! ordinals are not clustered together. The hash is the murmur3 64-bit
//! finalizer over a salted input. It is a bijection on `u64`, which lets key
//! text built from a scrambled ordinal be parsed back to the ordinal.

use super::Generator;

const SALT: u64 = 0x9e37_79b9_7f4a_7c15;
const M1: u64 = 0xff51_afd7_ed55_8ccd;
const M2: u64 = 0xc4ce_b9fe_1a85_ec53;
/// Multiplicative inverses of `M1`/`M2` modulo 2^64
const M1_INV: u64 = 0x4f74_430c_22a5_4005;
const M2_INV: u64 = 0x9cb4_b2f8_1293_37db;

/// Scramble a 64-bit value
#[inline]
pub fn mix64(value: u64) -> u64 {
    let mut h = value ^ SALT;
    h ^= h >> 33;
    h = h.wrapping_mul(M1);
    h ^= h >> 33;
    h = h.wrapping_mul(M2);
    h ^= h >> 33;
    h
}

/// Inverse of [`mix64`]
#[inline]
pub fn unmix64(hash: u64) -> u64 {
    let mut h = hash;
    h ^= h >> 33;
    h = h.wrapping_mul(M2_INV);
    h ^= h >> 33;
    h = h.wrapping_mul(M1_INV);
    h ^= h >> 33;
    h ^ SALT
}

/// Scrambles an inner generator's output over `[min, max]`
pub struct ScrambledGenerator<G> {
    inner: G,
    min: u64,
    items: u64,
    last: u64,
}

impl<G: Generator<u64>> ScrambledGenerator<G> {
    /// Wrap `inner`, mapping its hashed output into `[min, max]`
    pub fn new(inner: G, min: u64, max: u64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            inner,
            min,
            // Full u64 domain wraps to 0; treat as "no reduction"
            items: (max - min).wrapping_add(1),
            last: min,
        }
    }
}

impl<G: Generator<u64>> Generator<u64> for ScrambledGenerator<G> {
    fn next_value(&mut self) -> u64 {
        let hashed = mix64(self.inner.next_value());
        let offset = if self.items == 0 { hashed } else { hashed % self.items };
        self.last = self.min + offset;
        self.last
    }

    fn last_value(&self) -> u64 {
        self.last
    }
}
