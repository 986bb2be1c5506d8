//! Configuration settings for the priority search.

use jfp_core::{WarmStart, DEFAULT_EPOCH_BUDGET};

use crate::error::{SearchError, SearchResult};

/// Default number of search iterations.
pub const DEFAULT_ITERATIONS: u64 = 250;

/// Default number of greedy candidates per node.
pub const DEFAULT_MAX_CHILDREN: usize = 2;

/// Priority search settings.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    // === Model ===
    /// Maximum convergence epochs per evaluation.
    pub epoch_budget: usize,

    // === Search ===
    /// Number of selection/expansion/evaluation/backpropagation rounds.
    pub iterations: u64,

    /// Greedy candidates taken per node; `max_children / 2 + 1` random
    /// candidates are added on top.
    pub max_children: usize,

    /// Seed for candidate sampling.
    pub seed: u64,

    /// Heuristic for the root priority matrix.
    pub warm_start: WarmStart,

    // === Output ===
    /// Log progress information.
    pub verbose: bool,

    /// Log frequency (every N iterations).
    pub log_freq: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            epoch_budget: DEFAULT_EPOCH_BUDGET,
            iterations: DEFAULT_ITERATIONS,
            max_children: DEFAULT_MAX_CHILDREN,
            seed: 0,
            warm_start: WarmStart::default(),
            verbose: false,
            log_freq: 50,
        }
    }
}

impl SearchSettings {
    /// Create settings with verbose output enabled.
    pub fn verbose() -> Self {
        let mut s = Self::default();
        s.verbose = true;
        s.log_freq = 10;
        s
    }

    /// Set the iteration budget.
    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the per-node branching limit.
    pub fn with_max_children(mut self, max_children: usize) -> Self {
        self.max_children = max_children;
        self
    }

    /// Set the convergence epoch budget.
    pub fn with_epoch_budget(mut self, epochs: usize) -> Self {
        self.epoch_budget = epochs;
        self
    }

    /// Set the sampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the warm-start heuristic.
    pub fn with_warm_start(mut self, warm_start: WarmStart) -> Self {
        self.warm_start = warm_start;
        self
    }

    /// Reject settings the search cannot run with.
    pub fn validate(&self) -> SearchResult<()> {
        if self.epoch_budget == 0 {
            return Err(SearchError::InvalidSettings(
                "epoch_budget must be at least 1".to_string(),
            ));
        }
        if self.max_children == 0 {
            return Err(SearchError::InvalidSettings(
                "max_children must be at least 1".to_string(),
            ));
        }
        if self.log_freq == 0 {
            return Err(SearchError::InvalidSettings(
                "log_freq must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
