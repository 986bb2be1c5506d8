//! Error types for the priority search.

use jfp_core::ModelError;
use thiserror::Error;

/// Errors that can occur during a search.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Settings are out of range.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Demand or priority data was rejected, or the model failed.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Internal search invariant was violated.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type for search operations.
pub type SearchResult<T> = Result<T, SearchError>;
