//! Number generators
//!
//! Generators decide which key, field, operation and scan length comes next.
//! Every generator produces values inside a declared domain and remembers the
//! last value it handed out.
//!
//! # Generators
//!
//! - **Uniform**: equal probability over `[min, max]`
//! - **Zipfian**: power law over `[min, max]`, optionally with a hotspot
//! - **Sequential**: per-worker cursor over `[min, max)`, wrapping around
//! - **Counter**: shared atomic cursor, used for unique insert ordinals
//! - **Discrete**: weighted choice among arbitrary values (operation mix)
//! - **Exponential**: recency-biased values with a configurable tail
//! - **Latest**: zipfian skew anchored at the most recently inserted ordinal
//! - **Scrambled**: hashes another generator's output across the domain
//!
//! # Example
//!
//! ```
//! use kvpulse::distribution::{Generator, uniform::UniformGenerator};
//!
//! let mut gen = UniformGenerator::with_seed(0, 99, 7);
//! let v = gen.next_value();
//! assert!(v <= 99);
//! assert_eq!(gen.last_value(), v);
//! ```

/// Value generator contract
///
/// # Thread Safety
///
/// Generators must be `Send` so a worker can own them. Each worker builds its
/// own instances; only [`counter::CounterGenerator`] shares state, and it does
/// so through an atomic.
pub trait Generator<T>: Send {
    /// Advance and return the next value
    ///
    /// The returned value always lies in the generator's domain.
    fn next_value(&mut self) -> T;

    /// Return the value most recently produced by [`next_value`](Self::next_value)
    ///
    /// Does not advance. Before the first draw this is the domain minimum.
    fn last_value(&self) -> T;
}

impl<T, G: Generator<T> + ?Sized> Generator<T> for Box<G> {
    #[inline]
    fn next_value(&mut self) -> T {
        (**self).next_value()
    }

    #[inline]
    fn last_value(&self) -> T {
        (**self).last_value()
    }
}

pub mod constant;
pub mod counter;
pub mod discrete;
pub mod exponential;
pub mod latest;
pub mod registry;
pub mod scrambled;
pub mod sequential;
pub mod uniform;
pub mod zipf;

pub use registry::{DistributionParams, DistributionRegistry, Hotspot};
