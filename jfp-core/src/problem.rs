//! Demand and priority matrices.
//!
//! A solve is described by a [`DemandMatrix`]: for every (job, link) pair the
//! compute time and communication size the job needs on that link. A
//! [`PriorityMatrix`] assigns each active (job, link) pair a rank; rank 0 is
//! served first on its link.

use std::fmt;

use crate::error::{ModelError, ModelResult};

/// Resource demand of one job on one link.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinkDemand {
    /// Compute time attributed to this link.
    pub compute_time: f64,

    /// Communication volume pushed through this link.
    pub comm_size: f64,
}

impl LinkDemand {
    /// Create a demand cell.
    pub fn new(compute_time: f64, comm_size: f64) -> Self {
        Self {
            compute_time,
            comm_size,
        }
    }

    /// A cell is active unless both components are zero.
    pub fn is_active(&self) -> bool {
        self.compute_time != 0.0 || self.comm_size != 0.0
    }

    /// Compute plus communication.
    pub fn total(&self) -> f64 {
        self.compute_time + self.comm_size
    }
}

/// Per-job, per-link resource demand (J jobs x L links, row-major).
#[derive(Debug, Clone, PartialEq)]
pub struct DemandMatrix {
    jobs: usize,
    links: usize,
    cells: Vec<LinkDemand>,
}

impl DemandMatrix {
    /// Build a matrix from row-major cells and validate it.
    pub fn new(jobs: usize, links: usize, cells: Vec<LinkDemand>) -> ModelResult<Self> {
        let matrix = Self { jobs, links, cells };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Build a matrix from `(compute_time, comm_size)` rows, one row per job.
    ///
    /// Every row must have the same number of links.
    pub fn from_rows(rows: &[Vec<(f64, f64)>]) -> ModelResult<Self> {
        let jobs = rows.len();
        let links = rows.first().map(Vec::len).unwrap_or(0);

        let mut cells = Vec::with_capacity(jobs * links);
        for (j, row) in rows.iter().enumerate() {
            if row.len() != links {
                return Err(ModelError::InvalidDemand(format!(
                    "job {} has {} links, expected {}",
                    j,
                    row.len(),
                    links
                )));
            }
            cells.extend(row.iter().map(|&(c, m)| LinkDemand::new(c, m)));
        }

        Self::new(jobs, links, cells)
    }

    /// Check dimensions and values.
    pub fn validate(&self) -> ModelResult<()> {
        if self.jobs == 0 {
            return Err(ModelError::InvalidDemand("no jobs".to_string()));
        }
        if self.links == 0 {
            return Err(ModelError::InvalidDemand("no links".to_string()));
        }
        if self.cells.len() != self.jobs * self.links {
            return Err(ModelError::InvalidDemand(format!(
                "{} cells for a {}x{} matrix",
                self.cells.len(),
                self.jobs,
                self.links
            )));
        }

        for (idx, cell) in self.cells.iter().enumerate() {
            let ok = |v: f64| v.is_finite() && v >= 0.0;
            if !ok(cell.compute_time) || !ok(cell.comm_size) {
                return Err(ModelError::InvalidDemand(format!(
                    "job {} link {}: demand ({}, {}) must be finite and nonnegative",
                    idx / self.links,
                    idx % self.links,
                    cell.compute_time,
                    cell.comm_size
                )));
            }
        }

        Ok(())
    }

    /// Number of jobs.
    pub fn num_jobs(&self) -> usize {
        self.jobs
    }

    /// Number of links.
    pub fn num_links(&self) -> usize {
        self.links
    }

    /// Demand of `job` on `link`.
    pub fn get(&self, job: usize, link: usize) -> LinkDemand {
        self.cells[job * self.links + link]
    }

    /// Whether `job` uses `link` at all.
    pub fn is_active(&self, job: usize, link: usize) -> bool {
        self.get(job, link).is_active()
    }

    /// Uncontended completion time of `job`: compute plus communication over all links.
    pub fn job_total(&self, job: usize) -> f64 {
        self.row(job).iter().map(LinkDemand::total).sum()
    }

    /// Total communication of `job` over all links.
    pub fn job_comm(&self, job: usize) -> f64 {
        self.row(job).iter().map(|c| c.comm_size).sum()
    }

    /// Jobs active on `link`, in job order.
    pub fn active_jobs(&self, link: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.jobs).filter(move |&j| self.is_active(j, link))
    }

    fn row(&self, job: usize) -> &[LinkDemand] {
        &self.cells[job * self.links..(job + 1) * self.links]
    }
}

/// A (job, link) coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// Job index.
    pub job: usize,

    /// Link index.
    pub link: usize,
}

impl Position {
    /// Create a position.
    pub fn new(job: usize, link: usize) -> Self {
        Self { job, link }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(job {}, link {})", self.job, self.link)
    }
}

/// Adjacent-rank transposition on one link.
///
/// `promote` moves one rank closer to the front; `demote` is the job that
/// held that rank and moves one rank back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwapAction {
    /// Cell moved one rank earlier.
    pub promote: Position,

    /// Cell moved one rank later.
    pub demote: Position,
}

impl SwapAction {
    /// Create a swap action.
    pub fn new(promote: Position, demote: Position) -> Self {
        Self { promote, demote }
    }
}

impl fmt::Display for SwapAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "promote {} over {}", self.promote, self.demote)
    }
}

/// Per-link ranking of jobs (J x L, row-major). Rank 0 is served first.
///
/// Within a link the ranks held by active cells form a permutation of
/// `0..k-1`; inactive cells hold 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriorityMatrix {
    jobs: usize,
    links: usize,
    ranks: Vec<usize>,
}

impl PriorityMatrix {
    /// All-zero matrix.
    pub fn zeros(jobs: usize, links: usize) -> Self {
        Self {
            jobs,
            links,
            ranks: vec![0; jobs * links],
        }
    }

    /// Build from one row of ranks per job.
    pub fn from_rows(rows: &[Vec<usize>]) -> ModelResult<Self> {
        let jobs = rows.len();
        let links = rows.first().map(Vec::len).unwrap_or(0);
        let mut ranks = Vec::with_capacity(jobs * links);
        for (j, row) in rows.iter().enumerate() {
            if row.len() != links {
                return Err(ModelError::InvalidPriority(format!(
                    "job {} has {} links, expected {}",
                    j,
                    row.len(),
                    links
                )));
            }
            ranks.extend_from_slice(row);
        }
        Ok(Self { jobs, links, ranks })
    }

    /// Number of jobs.
    pub fn num_jobs(&self) -> usize {
        self.jobs
    }

    /// Number of links.
    pub fn num_links(&self) -> usize {
        self.links
    }

    /// Rank of `job` on `link`.
    pub fn rank(&self, job: usize, link: usize) -> usize {
        self.ranks[job * self.links + link]
    }

    /// Rank at a position.
    pub fn rank_at(&self, pos: Position) -> usize {
        self.rank(pos.job, pos.link)
    }

    /// Overwrite the rank of `job` on `link`.
    pub fn set_rank(&mut self, job: usize, link: usize, rank: usize) {
        self.ranks[job * self.links + link] = rank;
    }

    /// Rows of ranks, one per job.
    pub fn to_rows(&self) -> Vec<Vec<usize>> {
        self.ranks.chunks(self.links.max(1)).map(<[usize]>::to_vec).collect()
    }

    /// Active jobs on `link`, sorted by rank (front of the queue first).
    ///
    /// Fails if the active ranks are not exactly `0..k-1`.
    pub fn link_order(&self, demand: &DemandMatrix, link: usize) -> ModelResult<Vec<usize>> {
        let active: Vec<usize> = demand.active_jobs(link).collect();
        let mut order: Vec<Option<usize>> = vec![None; active.len()];

        for &job in &active {
            let rank = self.rank(job, link);
            let slot = order.get_mut(rank).ok_or_else(|| ModelError::BrokenRankOrder {
                link,
                detail: format!(
                    "job {} has rank {} but only {} jobs are active",
                    job,
                    rank,
                    active.len()
                ),
            })?;
            if let Some(other) = *slot {
                return Err(ModelError::BrokenRankOrder {
                    link,
                    detail: format!("jobs {} and {} share rank {}", other, job, rank),
                });
            }
            *slot = Some(job);
        }

        // Every slot is filled: k distinct ranks below k.
        Ok(order.into_iter().flatten().collect())
    }

    /// Check shape against `demand` and every link's rank order.
    pub fn validate(&self, demand: &DemandMatrix) -> ModelResult<()> {
        if self.jobs != demand.num_jobs() || self.links != demand.num_links() {
            return Err(ModelError::InvalidPriority(format!(
                "priority is {}x{}, demand is {}x{}",
                self.jobs,
                self.links,
                demand.num_jobs(),
                demand.num_links()
            )));
        }
        for link in 0..self.links {
            self.link_order(demand, link)?;
        }
        Ok(())
    }

    /// Active job holding `rank` on `link`.
    pub fn job_at(&self, demand: &DemandMatrix, link: usize, rank: usize) -> Option<usize> {
        demand
            .active_jobs(link)
            .find(|&job| self.rank(job, link) == rank)
    }

    /// Apply a swap, returning the child matrix.
    pub fn apply(&self, action: &SwapAction) -> ModelResult<Self> {
        let SwapAction { promote, demote } = *action;

        if promote.link != demote.link {
            return Err(ModelError::InvalidAction(format!(
                "{} and {} are on different links",
                promote, demote
            )));
        }
        if promote.job >= self.jobs || demote.job >= self.jobs || promote.link >= self.links {
            return Err(ModelError::InvalidAction(format!("{} is out of range", action)));
        }

        let promote_rank = self.rank_at(promote);
        let demote_rank = self.rank_at(demote);
        if promote_rank == 0 || demote_rank + 1 != promote_rank {
            return Err(ModelError::InvalidAction(format!(
                "{} has rank {}, {} has rank {}",
                promote, promote_rank, demote, demote_rank
            )));
        }

        let mut child = self.clone();
        child.set_rank(promote.job, promote.link, promote_rank - 1);
        child.set_rank(demote.job, demote.link, demote_rank + 1);
        Ok(child)
    }

    /// Force every inactive cell to rank 0.
    pub fn clear_inactive(&mut self, demand: &DemandMatrix) {
        for job in 0..self.jobs {
            for link in 0..self.links {
                if !demand.is_active(job, link) {
                    self.set_rank(job, link, 0);
                }
            }
        }
    }
}

impl fmt::Display for PriorityMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.to_rows() {
            let cells: Vec<String> = row.iter().map(usize::to_string).collect();
            writeln!(f, "[{}]", cells.join(", "))?;
        }
        Ok(())
    }
}
