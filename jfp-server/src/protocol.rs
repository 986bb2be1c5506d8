//! JSON request and response messages.
//!
//! A request maps job ids to link ids to that job's demand on the link:
//!
//! ```json
//! { "job-a": { "l1": { "comp_time": 1.0, "comm_size": 3.0 } } }
//! ```
//!
//! The response maps the same job ids to every link id seen in the request
//! and the rank assigned there. Jobs and links are ordered by id.
//!
//! Ranks count from the front of the queue: 0 is served first and larger
//! numbers are served later. Callers written for the older convention, where
//! a larger number meant higher priority, must invert the ranks per link.

use std::collections::{BTreeMap, BTreeSet};

use jfp_core::{DemandMatrix, LinkDemand, PriorityMatrix};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Demand of one job on one link, as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandEntry {
    /// Compute time.
    #[serde(rename = "comp_time", alias = "compute_time")]
    pub compute_time: f64,

    /// Communication size.
    pub comm_size: f64,
}

impl From<DemandEntry> for LinkDemand {
    fn from(entry: DemandEntry) -> Self {
        LinkDemand::new(entry.compute_time, entry.comm_size)
    }
}

/// Solve request: job id -> link id -> demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolveRequest {
    /// Demand per job and link.
    pub jobs: BTreeMap<String, BTreeMap<String, DemandEntry>>,
}

/// Job and link ids in matrix order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLayout {
    /// Row ids.
    pub jobs: Vec<String>,
    /// Column ids.
    pub links: Vec<String>,
}

impl SolveRequest {
    /// Parse a request payload.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ProtocolError::Empty);
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Build the demand matrix and the id layout it is indexed by.
    ///
    /// Links a job does not mention are inactive for that job.
    pub fn to_demand(&self) -> Result<(DemandMatrix, RequestLayout), ProtocolError> {
        if self.jobs.is_empty() {
            return Err(ProtocolError::Missing("jobs"));
        }

        let links: BTreeSet<&String> = self.jobs.values().flat_map(|l| l.keys()).collect();
        if links.is_empty() {
            return Err(ProtocolError::Missing("links"));
        }

        let mut cells = Vec::with_capacity(self.jobs.len() * links.len());
        for per_link in self.jobs.values() {
            for link in &links {
                let cell = per_link.get(*link).copied().map(LinkDemand::from);
                cells.push(cell.unwrap_or_default());
            }
        }

        let layout = RequestLayout {
            jobs: self.jobs.keys().cloned().collect(),
            links: links.into_iter().cloned().collect(),
        };
        let demand = DemandMatrix::new(layout.jobs.len(), layout.links.len(), cells)?;

        Ok((demand, layout))
    }
}

/// Solve response: job id -> link id -> rank.
///
/// Rank 0 is the highest priority on its link; this is not the
/// "larger is higher" convention some simulators expect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolveResponse {
    /// Rank per job and link; 0 is served first.
    pub ranks: BTreeMap<String, BTreeMap<String, usize>>,
}

impl SolveResponse {
    /// Label a priority matrix with the request's ids.
    pub fn from_priority(layout: &RequestLayout, priority: &PriorityMatrix) -> Self {
        let ranks = layout
            .jobs
            .iter()
            .enumerate()
            .map(|(j, job)| {
                let row = layout
                    .links
                    .iter()
                    .enumerate()
                    .map(|(l, link)| (link.clone(), priority.rank(j, l)))
                    .collect();
                (job.clone(), row)
            })
            .collect();

        Self { ranks }
    }

    /// Serialize for the wire.
    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_JOBS: &str = r#"{
        "j0": { "l0": { "comp_time": 1.0, "comm_size": 3.0 } },
        "j1": { "l0": { "comp_time": 1.0, "comm_size": 8.0 },
                "l1": { "comp_time": 0.0, "comm_size": 1.0 } },
        "j2": { "l1": { "compute_time": 1.0, "comm_size": 3.0 } }
    }"#;

    #[test]
    fn test_parse_and_layout() {
        let request = SolveRequest::from_slice(THREE_JOBS.as_bytes()).unwrap();
        let (demand, layout) = request.to_demand().unwrap();

        assert_eq!(layout.jobs, vec!["j0", "j1", "j2"]);
        assert_eq!(layout.links, vec!["l0", "l1"]);
        assert_eq!(demand.num_jobs(), 3);
        assert_eq!(demand.num_links(), 2);

        assert_eq!(demand.get(1, 0), LinkDemand::new(1.0, 8.0));
        // Alias spelling.
        assert_eq!(demand.get(2, 1), LinkDemand::new(1.0, 3.0));
        // Links a job omits are inactive.
        assert!(!demand.is_active(0, 1));
        assert!(!demand.is_active(2, 0));
    }

    #[test]
    fn test_malformed_requests() {
        assert!(matches!(
            SolveRequest::from_slice(b""),
            Err(ProtocolError::Empty)
        ));
        assert!(matches!(
            SolveRequest::from_slice(b"{\"j0\": "),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            SolveRequest::from_slice(br#"{"j0": {"l0": {"comm_size": 1.0}}}"#),
            Err(ProtocolError::Malformed(_))
        ));

        let empty = SolveRequest::from_slice(b"{}").unwrap();
        assert!(matches!(empty.to_demand(), Err(ProtocolError::Missing("jobs"))));

        let no_links = SolveRequest::from_slice(br#"{"j0": {}}"#).unwrap();
        assert!(matches!(no_links.to_demand(), Err(ProtocolError::Missing("links"))));

        let negative =
            SolveRequest::from_slice(br#"{"j0": {"l0": {"comp_time": -1.0, "comm_size": 1.0}}}"#)
                .unwrap();
        assert!(matches!(negative.to_demand(), Err(ProtocolError::Demand(_))));
    }

    #[test]
    fn test_response_covers_every_cell() {
        let request = SolveRequest::from_slice(THREE_JOBS.as_bytes()).unwrap();
        let (_, layout) = request.to_demand().unwrap();
        let priority =
            PriorityMatrix::from_rows(&[vec![1, 0], vec![0, 1], vec![0, 0]]).unwrap();

        let response = SolveResponse::from_priority(&layout, &priority);
        assert_eq!(response.ranks.len(), 3);
        assert!(response.ranks.values().all(|row| row.len() == 2));
        assert_eq!(response.ranks["j0"]["l0"], 1);
        assert_eq!(response.ranks["j1"]["l1"], 1);

        let json: serde_json::Value = serde_json::from_slice(&response.to_vec().unwrap()).unwrap();
        assert_eq!(json["j1"]["l0"], 0);
    }
}
