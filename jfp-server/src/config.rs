//! Process-level configuration.
//!
//! Solve parameters come from the command line, never from requests.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use jfp_core::WarmStart;
use jfp_search::SearchSettings;

/// Largest request accepted in one read.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 10_000;

/// How long a connection may stay silent before it is dropped.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address, `host:port`.
    pub addr: String,

    /// Size of the single read a request must fit in.
    pub max_request_bytes: usize,

    /// Limit on waiting for a request to arrive.
    pub read_timeout: Duration,

    /// Settings for every solve.
    pub settings: SearchSettings,
}

impl ServerConfig {
    /// Default configuration listening on `addr`.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            read_timeout: DEFAULT_READ_TIMEOUT,
            settings: SearchSettings::default(),
        }
    }

    /// Set the solve settings.
    pub fn with_settings(mut self, settings: SearchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the request size limit.
    pub fn with_max_request_bytes(mut self, bytes: usize) -> Self {
        self.max_request_bytes = bytes;
        self
    }

    /// Set the read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Check the configuration before binding.
    pub fn validate(&self) -> Result<()> {
        if self.max_request_bytes == 0 {
            bail!("max_request_bytes must be at least 1");
        }
        if self.read_timeout.is_zero() {
            bail!("read_timeout must be nonzero");
        }
        self.settings
            .validate()
            .context("Invalid search settings")?;
        Ok(())
    }
}

/// Warm-start heuristic choice on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum WarmStartChoice {
    /// Per-link communication share.
    #[default]
    Link,
    /// Job-wide communication share.
    Job,
    /// Job index order.
    Identity,
}

impl From<WarmStartChoice> for WarmStart {
    fn from(choice: WarmStartChoice) -> Self {
        match choice {
            WarmStartChoice::Link => WarmStart::LinkCommRatio,
            WarmStartChoice::Job => WarmStart::JobCommRatio,
            WarmStartChoice::Identity => WarmStart::Identity,
        }
    }
}

/// Solve flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    /// Convergence epochs per evaluation.
    #[arg(long, default_value_t = jfp_core::DEFAULT_EPOCH_BUDGET)]
    pub epochs: usize,

    /// Search iterations per solve.
    #[arg(long, default_value_t = jfp_search::settings::DEFAULT_ITERATIONS)]
    pub iterations: u64,

    /// Greedy candidate swaps per node.
    #[arg(long, default_value_t = jfp_search::settings::DEFAULT_MAX_CHILDREN)]
    pub max_children: usize,

    /// Seed for candidate sampling.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Warm-start heuristic.
    #[arg(long, value_enum, default_value_t = WarmStartChoice::Link)]
    pub warm_start: WarmStartChoice,

    /// Log search progress.
    #[arg(short, long)]
    pub verbose: bool,
}

impl SolveArgs {
    /// Build search settings from the flags.
    pub fn to_settings(&self) -> SearchSettings {
        let base = if self.verbose {
            SearchSettings::verbose()
        } else {
            SearchSettings::default()
        };
        base.with_epoch_budget(self.epochs)
            .with_iterations(self.iterations)
            .with_max_children(self.max_children)
            .with_seed(self.seed)
            .with_warm_start(self.warm_start.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        solve: SolveArgs,
    }

    #[test]
    fn test_default_flags_match_settings() {
        let cli = TestCli::parse_from(["test"]);
        let settings = cli.solve.to_settings();
        let defaults = SearchSettings::default();

        assert_eq!(settings.epoch_budget, defaults.epoch_budget);
        assert_eq!(settings.iterations, defaults.iterations);
        assert_eq!(settings.max_children, defaults.max_children);
        assert_eq!(settings.warm_start, WarmStart::LinkCommRatio);
        assert!(!settings.verbose);
    }

    #[test]
    fn test_flags_override() {
        let cli = TestCli::parse_from([
            "test",
            "--epochs",
            "4",
            "--iterations",
            "12",
            "--max-children",
            "3",
            "--warm-start",
            "job",
            "-v",
        ]);
        let settings = cli.solve.to_settings();

        assert_eq!(settings.epoch_budget, 4);
        assert_eq!(settings.iterations, 12);
        assert_eq!(settings.max_children, 3);
        assert_eq!(settings.warm_start, WarmStart::JobCommRatio);
        assert!(settings.verbose);
    }

    #[test]
    fn test_server_config() {
        let config = ServerConfig::new("127.0.0.1:0").with_max_request_bytes(512);
        assert_eq!(config.max_request_bytes, 512);
        assert_eq!(ServerConfig::new("x").max_request_bytes, 10_000);
        assert!(config.validate().is_ok());
        assert!(ServerConfig::new("x").with_max_request_bytes(0).validate().is_err());
        assert_eq!(ServerConfig::new("x").read_timeout, DEFAULT_READ_TIMEOUT);
        assert!(ServerConfig::new("x")
            .with_read_timeout(Duration::ZERO)
            .validate()
            .is_err());

        let bad = SearchSettings::default().with_max_children(0);
        assert!(ServerConfig::new("x").with_settings(bad).validate().is_err());
    }
}
