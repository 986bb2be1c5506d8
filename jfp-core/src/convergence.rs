//! Fixed-point model of strict-priority bandwidth sharing.
//!
//! On every link, jobs are served in rank order. A job's communication is
//! stretched by the slack its higher-priority co-users leave on the link:
//! the job at rank `r` contributes a factor `Y / (Y - c)`, where `Y` is its
//! total time and `c` its (already stretched) communication on the link, and
//! every job behind it is inflated by the product of those factors.
//!
//! Stretching changes each job's total time, which changes the factors it
//! imposes on others, so the model iterates in epochs until the mean slowdown
//! settles or the epoch budget runs out.

use crate::error::{ModelError, ModelResult};
use crate::problem::{DemandMatrix, Position, PriorityMatrix};

/// Default number of refinement epochs.
pub const DEFAULT_EPOCH_BUDGET: usize = 10;

/// Relative change in mean slowdown below which the epochs stop.
pub const CONVERGENCE_TOL: f64 = 0.03;

/// Per-cell predicted effect of promoting a job by one rank.
///
/// Each value is the normalized gain of the promoted job plus the normalized
/// loss of the job it overtakes. Lower values predict a larger objective
/// reduction. Cells that cannot be promoted (rank 0 or inactive) hold zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapDesirability {
    jobs: usize,
    links: usize,
    values: Vec<f64>,
}

impl SwapDesirability {
    /// All-zero matrix.
    pub fn zeros(jobs: usize, links: usize) -> Self {
        Self {
            jobs,
            links,
            values: vec![0.0; jobs * links],
        }
    }

    /// Number of jobs.
    pub fn num_jobs(&self) -> usize {
        self.jobs
    }

    /// Number of links.
    pub fn num_links(&self) -> usize {
        self.links
    }

    /// Value at `(job, link)`.
    pub fn get(&self, job: usize, link: usize) -> f64 {
        self.values[job * self.links + link]
    }

    /// Overwrite the value at `(job, link)`.
    pub fn set(&mut self, job: usize, link: usize, value: f64) {
        self.values[job * self.links + link] = value;
    }

    /// Nonzero cells in row-major order.
    pub fn nonzero_cells(&self) -> Vec<(Position, f64)> {
        self.values
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0.0)
            .map(|(idx, &v)| (Position::new(idx / self.links, idx % self.links), v))
            .collect()
    }
}

/// Result of running the model on one priority matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Mean over jobs of converged total time / uncontended total time.
    pub objective: f64,

    /// Per-job slowdown ratio (the terms of the mean).
    pub job_slowdown: Vec<f64>,

    /// Swap desirability derived from the first epoch.
    pub desirability: SwapDesirability,

    /// Epochs actually run.
    pub epochs_run: usize,
}

/// Times carried from one epoch to the next.
struct EpochState {
    /// Total time per job.
    totals: Vec<f64>,

    /// Stretched communication per (job, link), row-major.
    comm: Vec<f64>,
}

/// Simulate strict-priority sharing of `priority` under `demand`.
///
/// Deterministic in its inputs. Runs at most `epoch_budget` epochs and stops
/// early once the mean slowdown changes by less than [`CONVERGENCE_TOL`].
pub fn evaluate(
    demand: &DemandMatrix,
    priority: &PriorityMatrix,
    epoch_budget: usize,
) -> ModelResult<Evaluation> {
    if epoch_budget == 0 {
        return Err(ModelError::InvalidEpochBudget);
    }
    priority.validate(demand)?;

    let jobs = demand.num_jobs();
    let links = demand.num_links();

    let orders = (0..links)
        .map(|l| priority.link_order(demand, l))
        .collect::<ModelResult<Vec<_>>>()?;

    let initial_totals: Vec<f64> = (0..jobs).map(|j| demand.job_total(j)).collect();
    let compute: Vec<f64> = (0..jobs)
        .map(|j| (0..links).map(|l| demand.get(j, l).compute_time).sum())
        .collect();

    let mut state = EpochState {
        totals: initial_totals.clone(),
        comm: (0..jobs * links)
            .map(|idx| demand.get(idx / links, idx % links).comm_size)
            .collect(),
    };

    let mut desirability = None;
    let mut prev_mean: Option<f64> = None;
    let mut epochs_run = 0;

    for epoch in 0..epoch_budget {
        let factors = slack_factors(&orders, &state, links);
        let comm = stretch_comm(demand, &orders, &factors);

        let totals: Vec<f64> = (0..jobs)
            .map(|j| compute[j] + comm[j * links..(j + 1) * links].iter().sum::<f64>())
            .collect();

        if epoch == 0 {
            desirability = Some(swap_desirability(
                demand,
                &orders,
                &factors,
                &comm,
                &initial_totals,
            ));
        }

        state = EpochState { totals, comm };
        epochs_run = epoch + 1;

        let current = mean(&slowdowns(&state.totals, &initial_totals));
        log::trace!("epoch {}: mean slowdown {:.6}", epoch, current);

        if let Some(prev) = prev_mean {
            if (current / prev - 1.0).abs() < CONVERGENCE_TOL {
                break;
            }
        }
        prev_mean = Some(current);
    }

    let job_slowdown = slowdowns(&state.totals, &initial_totals);
    let objective = mean(&job_slowdown);
    if !objective.is_finite() {
        return Err(ModelError::NumericFault(format!(
            "objective is {} after {} epochs",
            objective, epochs_run
        )));
    }

    Ok(Evaluation {
        objective,
        job_slowdown,
        desirability: desirability.unwrap_or_else(|| SwapDesirability::zeros(jobs, links)),
        epochs_run,
    })
}

/// Slack factor imposed by the job at each rank of each link.
fn slack_factors(orders: &[Vec<usize>], state: &EpochState, links: usize) -> Vec<Vec<f64>> {
    orders
        .iter()
        .enumerate()
        .map(|(link, order)| {
            order
                .iter()
                .map(|&job| {
                    let total = state.totals[job];
                    let comm = state.comm[job * links + link];
                    let free = total - comm;
                    // A job saturated by this link leaves nothing to stretch.
                    if free <= 0.0 {
                        1.0
                    } else {
                        total / free
                    }
                })
                .collect()
        })
        .collect()
}

/// Base communication stretched by the factors of every job ahead in line.
fn stretch_comm(demand: &DemandMatrix, orders: &[Vec<usize>], factors: &[Vec<f64>]) -> Vec<f64> {
    let links = demand.num_links();
    let mut comm = vec![0.0; demand.num_jobs() * links];

    for (link, order) in orders.iter().enumerate() {
        let mut ahead = 1.0;
        for (rank, &job) in order.iter().enumerate() {
            comm[job * links + link] = demand.get(job, link).comm_size * ahead;
            ahead *= factors[link][rank];
        }
    }

    comm
}

fn swap_desirability(
    demand: &DemandMatrix,
    orders: &[Vec<usize>],
    factors: &[Vec<f64>],
    comm: &[f64],
    initial_totals: &[f64],
) -> SwapDesirability {
    let links = demand.num_links();
    let mut out = SwapDesirability::zeros(demand.num_jobs(), links);

    for (link, order) in orders.iter().enumerate() {
        // Rank 0 has nobody to overtake.
        for rank in 1..order.len() {
            let job = order[rank];
            let peer = order[rank - 1];

            let c_job = comm[job * links + link];
            let gain = (c_job / factors[link][rank - 1] - c_job) / initial_totals[job];

            let c_peer = comm[peer * links + link];
            let loss = (c_peer * factors[link][rank] - c_peer) / initial_totals[peer];

            out.set(job, link, gain + loss);
        }
    }

    out
}

/// Per-job ratio of current to uncontended total time; idle jobs count as 1.
fn slowdowns(totals: &[f64], initial_totals: &[f64]) -> Vec<f64> {
    totals
        .iter()
        .zip(initial_totals)
        .map(|(&t, &t0)| if t0 > 0.0 { t / t0 } else { 1.0 })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
