//! Error types for the link-sharing model.

use thiserror::Error;

/// Errors raised while validating or evaluating a priority assignment.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Demand matrix is malformed.
    #[error("Invalid demand: {0}")]
    InvalidDemand(String),

    /// Priority matrix does not match the demand matrix.
    #[error("Invalid priority: {0}")]
    InvalidPriority(String),

    /// Active ranks on a link are not a contiguous permutation.
    #[error("Rank order on link {link} is broken: {detail}")]
    BrokenRankOrder {
        /// Offending link.
        link: usize,
        /// What was found instead.
        detail: String,
    },

    /// Swap does not describe an adjacent-rank transposition.
    #[error("Invalid swap action: {0}")]
    InvalidAction(String),

    /// Convergence needs at least one epoch.
    #[error("Epoch budget must be at least 1")]
    InvalidEpochBudget,

    /// Convergence arithmetic produced a non-finite value.
    #[error("Numeric fault during convergence: {0}")]
    NumericFault(String),
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
