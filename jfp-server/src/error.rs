//! Error types for the request front end.

use jfp_core::ModelError;
use jfp_search::SearchError;
use thiserror::Error;

/// A request could not be turned into a demand matrix.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Nothing was read from the connection.
    #[error("Empty request")]
    Empty,

    /// The payload is not valid JSON of the expected shape.
    #[error("Malformed request: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The request names no jobs or no links.
    #[error("Request has no {0}")]
    Missing(&'static str),

    /// The demand values were rejected.
    #[error("Invalid demand: {0}")]
    Demand(#[from] ModelError),
}

/// Failure while handling one connection's request.
#[derive(Error, Debug)]
pub enum RequestError {
    /// Bad input; logged and dropped.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The solve itself failed.
    #[error("Solve failed: {0}")]
    Solve(#[from] SearchError),
}
