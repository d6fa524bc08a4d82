//! Distribution registry
//!
//! Maps distribution names to constructor functions. The registry is built
//! once at startup and handed to the workload engine; there is no global
//! registration.
//!
//! # Example
//!
//! ```
//! use kvpulse::distribution::{DistributionParams, DistributionRegistry, Generator};
//!
//! let registry = DistributionRegistry::with_defaults();
//! let params = DistributionParams::new(0, 99);
//! let mut gen = registry.build("zipfian", &params).unwrap();
//! assert!(gen.next_value() <= 99);
//! ```

use super::constant::ConstantGenerator;
use super::counter::CounterGenerator;
use super::exponential::{self, ExponentialGenerator};
use super::latest::LatestGenerator;
use super::scrambled::ScrambledGenerator;
use super::sequential::SequentialGenerator;
use super::uniform::UniformGenerator;
use super::zipf::{self, ZipfianGenerator};
use super::Generator;
use crate::error::ConfigError;
use std::collections::BTreeMap;

pub use super::zipf::Hotspot;

/// Boxed ordinal generator
pub type BoxedGenerator = Box<dyn Generator<u64>>;

/// Constructor signature stored in the registry
pub type GeneratorCtor = fn(&DistributionParams) -> Result<BoxedGenerator, ConfigError>;

/// Parameters handed to a constructor
#[derive(Debug, Clone)]
pub struct DistributionParams {
    /// Inclusive lower bound
    pub min: u64,
    /// Inclusive upper bound
    pub max: u64,
    /// Zipfian skew
    pub theta: f64,
    /// Optional hot set (zipfian only)
    pub hotspot: Option<Hotspot>,
    /// Exponential: percentile of draws within `exponential_range`
    pub exponential_percentile: f64,
    /// Exponential: range expressed in ordinals
    pub exponential_range: f64,
    /// Insert counter anchoring recency-based generators
    pub counter: Option<CounterGenerator>,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
}

impl DistributionParams {
    /// Defaults over `[min, max]`
    pub fn new(min: u64, max: u64) -> Self {
        let items = max.saturating_sub(min) + 1;
        Self {
            min,
            max,
            theta: zipf::DEFAULT_THETA,
            hotspot: None,
            exponential_percentile: exponential::DEFAULT_PERCENTILE,
            exponential_range: items as f64 * exponential::DEFAULT_FRAC,
            counter: None,
            seed: None,
        }
    }

    /// Set the zipfian skew
    pub fn theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    /// Set the hotspot
    pub fn hotspot(mut self, hotspot: Option<Hotspot>) -> Self {
        self.hotspot = hotspot;
        self
    }

    /// Set the anchoring counter
    pub fn counter(mut self, counter: CounterGenerator) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Set the seed
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

/// Name to constructor mapping
#[derive(Clone)]
pub struct DistributionRegistry {
    ctors: BTreeMap<String, GeneratorCtor>,
}

impl DistributionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            ctors: BTreeMap::new(),
        }
    }

    /// Registry with every bundled distribution
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("constant", build_constant);
        registry.register("uniform", build_uniform);
        registry.register("zipfian", build_zipfian);
        registry.register("scrambled_zipfian", build_scrambled_zipfian);
        registry.register("sequential", build_sequential);
        registry.register("latest", build_latest);
        registry.register("exponential", build_exponential);
        registry
    }

    /// Add or replace a constructor
    pub fn register(&mut self, name: impl Into<String>, ctor: GeneratorCtor) {
        self.ctors.insert(name.into(), ctor);
    }

    /// Whether `name` is known
    pub fn contains(&self, name: &str) -> bool {
        self.ctors.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ctors.keys().map(String::as_str)
    }

    /// Build a generator by name
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownDistribution`] for unregistered names, or whatever
    /// the constructor rejects.
    pub fn build(&self, name: &str, params: &DistributionParams) -> Result<BoxedGenerator, ConfigError> {
        let ctor = self.ctors.get(name).ok_or_else(|| ConfigError::UnknownDistribution {
            name: name.to_string(),
        })?;
        ctor(params)
    }
}

impl Default for DistributionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for DistributionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.ctors.keys()).finish()
    }
}

fn build_constant(p: &DistributionParams) -> Result<BoxedGenerator, ConfigError> {
    Ok(Box::new(ConstantGenerator(p.max)))
}

fn build_uniform(p: &DistributionParams) -> Result<BoxedGenerator, ConfigError> {
    Ok(Box::new(match p.seed {
        Some(seed) => UniformGenerator::with_seed(p.min, p.max, seed),
        None => UniformGenerator::new(p.min, p.max),
    }))
}

fn build_zipfian(p: &DistributionParams) -> Result<BoxedGenerator, ConfigError> {
    Ok(Box::new(ZipfianGenerator::with_options(
        p.min, p.max, p.theta, p.hotspot, p.seed,
    )?))
}

fn build_scrambled_zipfian(p: &DistributionParams) -> Result<BoxedGenerator, ConfigError> {
    let inner = ZipfianGenerator::with_options(p.min, p.max, p.theta, p.hotspot, p.seed)?;
    Ok(Box::new(ScrambledGenerator::new(inner, p.min, p.max)))
}

fn build_sequential(p: &DistributionParams) -> Result<BoxedGenerator, ConfigError> {
    Ok(Box::new(SequentialGenerator::new(p.min, p.max.saturating_add(1))))
}

fn build_latest(p: &DistributionParams) -> Result<BoxedGenerator, ConfigError> {
    let counter = p
        .counter
        .clone()
        .ok_or_else(|| ConfigError::invalid("requestdistribution", "`latest` needs an insert counter"))?;
    let items = p.max.saturating_sub(p.min) + 1;
    Ok(Box::new(LatestGenerator::new(counter, p.min, items, p.theta, p.seed)?))
}

fn build_exponential(p: &DistributionParams) -> Result<BoxedGenerator, ConfigError> {
    Ok(Box::new(ExponentialGenerator::with_options(
        p.min,
        p.max,
        p.exponential_percentile,
        p.exponential_range,
        p.seed,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_defaults() {
        let registry = DistributionRegistry::with_defaults();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "constant",
                "exponential",
                "latest",
                "scrambled_zipfian",
                "sequential",
                "uniform",
                "zipfian"
            ]
        );
    }

    #[test]
    fn test_registry_builds_in_domain() {
        let registry = DistributionRegistry::with_defaults();
        let params = DistributionParams::new(10, 20)
            .seed(Some(1))
            .counter(CounterGenerator::new(10));

        for name in ["uniform", "zipfian", "scrambled_zipfian", "sequential", "exponential"] {
            let mut gen = registry.build(name, &params).unwrap();
            for _ in 0..500 {
                let v = gen.next_value();
                assert!((10..=20).contains(&v), "{} produced {}", name, v);
            }
        }

        let mut constant = registry.build("constant", &params).unwrap();
        assert_eq!(constant.next_value(), 20);
    }

    #[test]
    fn test_registry_sequential_covers_inclusive_max() {
        let registry = DistributionRegistry::with_defaults();
        let mut gen = registry.build("sequential", &DistributionParams::new(0, 2)).unwrap();
        let values: Vec<_> = (0..4).map(|_| gen.next_value()).collect();
        assert_eq!(values, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_registry_unknown_name() {
        let registry = DistributionRegistry::with_defaults();
        let err = registry.build("gaussian", &DistributionParams::new(0, 1)).err();
        assert_eq!(
            err,
            Some(ConfigError::UnknownDistribution {
                name: "gaussian".to_string()
            })
        );
    }

    #[test]
    fn test_registry_latest_requires_counter() {
        let registry = DistributionRegistry::with_defaults();
        assert!(registry.build("latest", &DistributionParams::new(0, 10)).is_err());
    }

    #[test]
    fn test_registry_custom_entry() {
        fn always_seven(_: &DistributionParams) -> Result<BoxedGenerator, ConfigError> {
            Ok(Box::new(ConstantGenerator(7)))
        }

        let mut registry = DistributionRegistry::new();
        assert!(!registry.contains("seven"));
        registry.register("seven", always_seven);
        let mut gen = registry.build("seven", &DistributionParams::new(0, 0)).unwrap();
        assert_eq!(gen.next_value(), 7);
    }
}
