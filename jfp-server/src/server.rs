//! Blocking TCP front end.
//!
//! Connections are served one at a time. Each carries exactly one request,
//! which must arrive in a single read; the response is written back and the
//! connection closed. Bad requests and failed solves get no reply.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

use anyhow::{Context, Result};
use jfp_search::{solve, SearchSettings};

use crate::config::ServerConfig;
use crate::error::RequestError;
use crate::protocol::{SolveRequest, SolveResponse};

/// Decode, solve and encode one request.
pub fn handle_request(
    bytes: &[u8],
    settings: &SearchSettings,
) -> Result<SolveResponse, RequestError> {
    let request = SolveRequest::from_slice(bytes)?;
    let (demand, layout) = request.to_demand()?;
    log::info!(
        "Received request: {} jobs x {} links",
        demand.num_jobs(),
        demand.num_links()
    );

    let solution = solve(&demand, settings)?;
    log::info!(
        "Solved: objective {:.6} (warm start {:.6}), {} iterations, {} ms",
        solution.objective,
        solution.warm_start_objective,
        solution.iterations,
        solution.solve_time_ms
    );

    Ok(SolveResponse::from_priority(&layout, &solution.priority))
}

/// A bound listener plus its configuration.
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
}

impl Server {
    /// Validate `config` and bind its address.
    pub fn bind(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let listener = TcpListener::bind(&config.addr)
            .with_context(|| format!("Failed to bind {}", config.addr))?;
        Ok(Self { listener, config })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read listener address")
    }

    /// Serve connections until the listener fails.
    pub fn serve(&self) -> Result<()> {
        log::info!("JFP solver listening on {}", self.local_addr()?);
        loop {
            self.serve_one()?;
        }
    }

    /// Accept and handle a single connection.
    ///
    /// Only accept failures are returned; a broken connection is logged and
    /// dropped.
    pub fn serve_one(&self) -> Result<()> {
        let (stream, peer) = self
            .listener
            .accept()
            .context("Failed to accept connection")?;
        log::debug!("Connection from {}", peer);

        if let Err(e) = self.handle_connection(stream) {
            log::warn!("Connection from {} failed: {:#}", peer, e);
        }
        Ok(())
    }

    fn handle_connection(&self, mut stream: TcpStream) -> Result<()> {
        stream
            .set_read_timeout(Some(self.config.read_timeout))
            .context("Failed to set read timeout")?;

        let mut buf = vec![0u8; self.config.max_request_bytes];
        let n = stream.read(&mut buf).context("Failed to read request")?;

        match handle_request(&buf[..n], &self.config.settings) {
            Ok(response) => {
                let bytes = response.to_vec().context("Failed to encode response")?;
                stream
                    .write_all(&bytes)
                    .context("Failed to write response")?;
            }
            Err(RequestError::Protocol(e)) => {
                log::warn!("Dropping request ({} bytes): {}", n, e);
            }
            Err(RequestError::Solve(e)) => {
                log::error!("{}", e);
            }
        }

        Ok(())
    }
}
