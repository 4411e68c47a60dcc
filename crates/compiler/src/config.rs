use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// CONFIG ERROR
// ================================================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "chain length {0} is shorter than the {samples} samples to log",
        samples = RunConfig::NUM_SAMPLES
    )]
    ChainTooShort(u64),
    #[error("log interval must be at least 1")]
    ZeroLogInterval,
    #[error("log interval {log_every} is longer than the chain ({chain_length})")]
    LogIntervalTooLong { log_every: u64, chain_length: u64 },
    #[error("coupled MCMC needs at least 2 chains, got {0}")]
    TooFewChains(u32),
    #[error("coupled MCMC target acceptance {0} is outside (0, 1)")]
    InvalidAcceptanceTarget(f64),
}

// CHAIN KIND
// ================================================================================================

/// The sampler driving the run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChainKind {
    #[default]
    Mcmc,
    /// Metropolis-coupled MCMC: several heated chains swapping states.
    Coupled(CoupledChains),
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoupledChains {
    pub chains: u32,
    pub delta_temperature: f64,
    pub resample_every: u64,
    /// Target swap acceptance probability.
    pub target: f64,
}

impl Default for CoupledChains {
    fn default() -> Self {
        Self {
            chains: 4,
            delta_temperature: 0.1,
            resample_every: 1000,
            target: 0.234,
        }
    }
}

// RUN CONFIG
// ================================================================================================

/// Settings of the inference run the compiled model is packaged with.
///
/// - `chain_length` is the number of MCMC iterations.
/// - `log_every` defaults to `chain_length / NUM_SAMPLES`.
/// - `pre_burnin` defaults to ten times the summed dimension of the state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunConfig {
    chain_length: u64,
    pre_burnin: Option<u64>,
    log_every: Option<u64>,
    sample_from_prior: bool,
    log_unicode: bool,
    file_stem: String,
    observed: BTreeSet<String>,
    not_logged: BTreeSet<String>,
    chain: ChainKind,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            chain_length: Self::DEFAULT_CHAIN_LENGTH,
            pre_burnin: None,
            log_every: None,
            sample_from_prior: false,
            log_unicode: false,
            file_stem: "model".to_string(),
            observed: BTreeSet::new(),
            not_logged: BTreeSet::new(),
            chain: ChainKind::Mcmc,
        }
    }
}

impl RunConfig {
    // CONSTANTS
    // --------------------------------------------------------------------------------------------

    /// Number of samples a run is expected to log.
    pub const NUM_SAMPLES: u64 = 2000;

    pub const DEFAULT_CHAIN_LENGTH: u64 = 1_000_000;

    /// Pre-burn-in iterations per unit of state dimension.
    pub const PRE_BURNIN_PER_DIMENSION: u64 = 10;

    /// The screen logger reports this many times less often than the file logger.
    pub const SCREEN_LOG_FACTOR: u64 = 100;

    // CONSTRUCTOR
    // --------------------------------------------------------------------------------------------

    /// Creates a config for a chain of `chain_length` iterations.
    pub fn new(chain_length: u64) -> Result<Self, ConfigError> {
        let config = Self { chain_length, ..Self::default() };
        config.validate()?;
        Ok(config)
    }

    pub fn with_pre_burnin(mut self, pre_burnin: u64) -> Self {
        self.pre_burnin = Some(pre_burnin);
        self
    }

    pub fn with_log_every(mut self, log_every: u64) -> Self {
        self.log_every = Some(log_every);
        self
    }

    pub fn with_sample_from_prior(mut self, sample_from_prior: bool) -> Self {
        self.sample_from_prior = sample_from_prior;
        self
    }

    /// Keeps identifiers as written instead of spelling Greek letters out.
    pub fn with_unicode_ids(mut self, log_unicode: bool) -> Self {
        self.log_unicode = log_unicode;
        self
    }

    pub fn with_file_stem(mut self, stem: impl Into<String>) -> Self {
        self.file_stem = stem.into();
        self
    }

    /// Fixes the named model values at their current content.
    pub fn with_observed<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.observed.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Leaves the named values out of the file logger.
    pub fn with_not_logged<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.not_logged.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_coupled_chains(mut self, coupled: CoupledChains) -> Self {
        self.chain = ChainKind::Coupled(coupled);
        self
    }

    // VALIDATION
    // --------------------------------------------------------------------------------------------

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_length < Self::NUM_SAMPLES {
            return Err(ConfigError::ChainTooShort(self.chain_length));
        }
        match self.log_every {
            Some(0) => return Err(ConfigError::ZeroLogInterval),
            Some(log_every) if log_every > self.chain_length => {
                return Err(ConfigError::LogIntervalTooLong {
                    log_every,
                    chain_length: self.chain_length,
                });
            },
            _ => (),
        }
        if let ChainKind::Coupled(coupled) = &self.chain {
            if coupled.chains < 2 {
                return Err(ConfigError::TooFewChains(coupled.chains));
            }
            if !(coupled.target > 0.0 && coupled.target < 1.0) {
                return Err(ConfigError::InvalidAcceptanceTarget(coupled.target));
            }
        }
        Ok(())
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    pub const fn chain_length(&self) -> u64 {
        self.chain_length
    }

    /// The explicit pre-burn-in, `None` when it is derived from the state.
    pub const fn pre_burnin(&self) -> Option<u64> {
        self.pre_burnin
    }

    /// The file logger interval.
    pub fn log_every(&self) -> u64 {
        self.log_every.unwrap_or(self.chain_length / Self::NUM_SAMPLES).max(1)
    }

    /// How many samples the file logger will write.
    pub fn logged_samples(&self) -> u64 {
        self.chain_length / self.log_every()
    }

    pub const fn sample_from_prior(&self) -> bool {
        self.sample_from_prior
    }

    pub const fn log_unicode(&self) -> bool {
        self.log_unicode
    }

    pub fn file_stem(&self) -> &str {
        &self.file_stem
    }

    pub fn is_observed(&self, id: &str) -> bool {
        self.observed.contains(id)
    }

    pub fn is_logged(&self, id: &str) -> bool {
        !self.not_logged.contains(id)
    }

    pub const fn chain(&self) -> &ChainKind {
        &self.chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_interval_defaults_to_sample_count() {
        let config = RunConfig::default();
        assert_eq!(config.log_every(), 500);
        assert_eq!(config.logged_samples(), 2000);

        let config = RunConfig::new(10_000).unwrap().with_log_every(20);
        assert_eq!(config.logged_samples(), 500);
    }

    #[test]
    fn short_chains_are_rejected() {
        assert_eq!(RunConfig::new(1999), Err(ConfigError::ChainTooShort(1999)));
        let config = RunConfig::new(5000).unwrap().with_log_every(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroLogInterval));
    }

    #[test]
    fn coupled_chains_are_validated() {
        let config = RunConfig::default()
            .with_coupled_chains(CoupledChains { chains: 1, ..CoupledChains::default() });
        assert_eq!(config.validate(), Err(ConfigError::TooFewChains(1)));

        let config = RunConfig::default().with_coupled_chains(CoupledChains::default());
        assert!(config.validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_loads_from_partial_json() {
        let config: RunConfig =
            serde_json::from_str(r#"{ "chain_length": 20000, "observed": ["mu"] }"#).unwrap();
        assert_eq!(config.chain_length(), 20_000);
        assert!(config.is_observed("mu"));
        assert_eq!(config.file_stem(), "model");
    }
}
