//! Search solution types.

use jfp_core::PriorityMatrix;

use crate::search::NodeId;

/// Best priority assignment found by a search, with diagnostics.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Best priority matrix; inactive cells are 0.
    pub priority: PriorityMatrix,

    /// Objective (mean slowdown) of `priority`.
    pub objective: f64,

    /// Per-job slowdown under `priority`.
    pub job_slowdown: Vec<f64>,

    /// Objective of the warm-start root.
    pub warm_start_objective: f64,

    /// Arena index of the best node.
    pub best_node: NodeId,

    /// Depth of the best node (swaps away from the warm start).
    pub best_depth: usize,

    /// Backpropagation passes through the best node.
    pub best_visits: u64,

    /// Iterations run.
    pub iterations: u64,

    /// Nodes created.
    pub nodes_created: usize,

    /// Convergence model evaluations.
    pub evaluations: u64,

    /// Total solve time in milliseconds.
    pub solve_time_ms: u64,
}

impl Solution {
    /// Relative objective reduction over the warm start, in `[0, 1)`.
    pub fn improvement(&self) -> f64 {
        if self.warm_start_objective <= 0.0 {
            return 0.0;
        }
        (self.warm_start_objective - self.objective) / self.warm_start_objective
    }

    /// Largest per-job slowdown.
    pub fn max_slowdown(&self) -> f64 {
        self.job_slowdown.iter().copied().fold(0.0, f64::max)
    }
}
