//! Run configuration.
//!
//! One [`RunConfig`] is built at startup and passed by reference to every
//! component; nothing about a run lives in global state.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::{Error, Result};

/// The mutation operator used for the whole run.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MutationKind {
    /// Single Active Mutation.
    Sam,
    /// SAM alternating with Guided Active Mutation.
    SamGam,
    /// Point Mutation.
    Pm,
}

impl MutationKind {
    pub fn from_selector(selector: u32) -> Option<MutationKind> {
        match selector {
            1 => Some(MutationKind::Sam),
            2 => Some(MutationKind::SamGam),
            3 => Some(MutationKind::Pm),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MutationKind::Sam => "SAM",
            MutationKind::SamGam => "SAM+GAM",
            MutationKind::Pm => "PM",
        }
    }
}

impl Display for MutationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for MutationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(MutationKind::from_selector)
            .ok_or_else(|| Error::InvalidMutation(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub seed: u64,
    pub columns: usize,
    pub rows: usize,
    /// Maximum column distance of a node-to-node connection.
    pub levels_back: usize,
    pub max_evaluations: u64,
    pub mutation: MutationKind,
    pub population_size: usize,
    /// Fraction of all alleles touched by one point mutation.
    pub point_mutation_rate: f64,
    /// Probability that SAM+GAM picks the guided operator.
    pub guided_probability: f64,
    /// Pool occupancy that triggers a garbage collection.
    pub gc_threshold: f64,
    pub pool_bits: usize,
    pub cache_bits: usize,
}

impl RunConfig {
    pub const DEFAULT_POPULATION_SIZE: usize = 5;

    /// Build a configuration with the default tuning; `levels_back` is
    /// derived as half the column count.
    pub fn new(seed: u64, columns: usize, max_evaluations: u64, mutation: MutationKind) -> Self {
        Self {
            seed,
            columns,
            rows: 1,
            levels_back: columns / 2,
            max_evaluations,
            mutation,
            population_size: Self::DEFAULT_POPULATION_SIZE,
            point_mutation_rate: 0.05,
            guided_probability: 0.5,
            gc_threshold: 0.75,
            pool_bits: 20,
            cache_bits: 16,
        }
    }

    pub fn with_population_size(mut self, population_size: usize) -> Self {
        self.population_size = population_size;
        self
    }

    pub fn with_pool(mut self, pool_bits: usize, cache_bits: usize) -> Self {
        self.pool_bits = pool_bits;
        self.cache_bits = cache_bits;
        self
    }

    pub fn num_nodes(&self) -> usize {
        self.columns * self.rows
    }

    /// Offspring evaluated per generation.
    pub fn evaluations_per_generation(&self) -> u64 {
        (self.population_size - 1) as u64
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(Error::Config("ncol must be at least 1".to_string()));
        }
        if i64::try_from(self.max_evaluations).is_err() {
            return Err(Error::Config(format!(
                "maxeval must not exceed {}",
                i64::MAX
            )));
        }
        if self.population_size < 2 {
            return Err(Error::Config(
                "population size must be at least 2".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.point_mutation_rate)
            || !(0.0..=1.0).contains(&self.guided_probability)
            || !(0.0..=1.0).contains(&self.gc_threshold)
        {
            return Err(Error::Config(
                "rates and thresholds must lie in [0, 1]".to_string(),
            ));
        }
        if self.pool_bits < 2 || self.pool_bits > 31 || self.cache_bits > 31 {
            return Err(Error::Config(
                "pool bits must be in 2..=31 and cache bits in 0..=31".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a `key=value` positional argument.
pub fn parse_key_value<T: FromStr>(arg: &str, key: &str) -> Result<T> {
    let value = arg
        .strip_prefix(key)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or_else(|| Error::Config(format!("expected '{}=<value>', got '{}'", key, arg)))?;
    value
        .parse()
        .map_err(|_| Error::Config(format!("invalid value for '{}': '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_back_is_half_the_columns() {
        let config = RunConfig::new(1, 10, 100, MutationKind::Sam);
        assert_eq!(config.levels_back, 5);
        let config = RunConfig::new(1, 1, 100, MutationKind::Sam);
        assert_eq!(config.levels_back, 0);
    }

    #[test]
    fn test_mutation_selector() {
        assert_eq!("1".parse::<MutationKind>().unwrap(), MutationKind::Sam);
        assert_eq!("2".parse::<MutationKind>().unwrap(), MutationKind::SamGam);
        assert_eq!("3".parse::<MutationKind>().unwrap(), MutationKind::Pm);
        assert!(matches!(
            "4".parse::<MutationKind>(),
            Err(Error::InvalidMutation(s)) if s == "4"
        ));
        assert!("x".parse::<MutationKind>().is_err());
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value::<u64>("seed=42", "seed").unwrap(), 42);
        assert_eq!(parse_key_value::<usize>("ncol=8", "ncol").unwrap(), 8);
        assert!(parse_key_value::<u64>("seed42", "seed").is_err());
        assert!(parse_key_value::<u64>("ncol=8", "seed").is_err());
        assert!(parse_key_value::<u64>("seed=abc", "seed").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(RunConfig::new(1, 4, 10, MutationKind::Pm).validate().is_ok());
        assert!(RunConfig::new(1, 0, 10, MutationKind::Pm).validate().is_err());
        assert!(RunConfig::new(1, 4, 10, MutationKind::Pm)
            .with_population_size(1)
            .validate()
            .is_err());
        assert!(RunConfig::new(1, 4, i64::MAX as u64, MutationKind::Pm).validate().is_ok());
        assert!(RunConfig::new(1, 4, u64::MAX, MutationKind::Pm).validate().is_err());
    }
}
