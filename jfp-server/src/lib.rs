//! Request front end for the JFP priority solver.
//!
//! - [`protocol`]: JSON request/response messages and their mapping to the
//!   solver's matrices
//! - [`server`]: one-request-per-connection TCP loop
//! - [`config`]: server configuration and shared command line flags
//! - [`bench`]: random-instance comparison against the warm start

#![warn(missing_docs)]

pub mod bench;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;

pub use config::{
    ServerConfig, SolveArgs, WarmStartChoice, DEFAULT_MAX_REQUEST_BYTES, DEFAULT_READ_TIMEOUT,
};
pub use error::{ProtocolError, RequestError};
pub use protocol::{DemandEntry, RequestLayout, SolveRequest, SolveResponse};
pub use server::{handle_request, Server};
