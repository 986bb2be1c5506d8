//! Random-instance comparison of the search against its warm start.

use std::time::Instant;

use jfp_core::{warm_start, DemandMatrix, LinkDemand, ModelResult};
use jfp_search::{evaluate_priority, solve, SearchError, SearchResult, SearchSettings};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Max-slowdown improvement above which a trial is reported.
pub const NOTABLE_IMPROVEMENT: f64 = 0.15;

/// Shape of the generated instances.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Number of instances.
    pub trials: usize,
    /// Jobs per instance.
    pub jobs: usize,
    /// Links per instance.
    pub links: usize,
    /// Instance generator seed.
    pub seed: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            trials: 100,
            jobs: 3,
            links: 4,
            seed: 12345,
        }
    }
}

/// Outcome of one instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    /// Mean slowdown of the warm start.
    pub warm_start_objective: f64,
    /// Mean slowdown after the search.
    pub search_objective: f64,
    /// Worst job slowdown of the warm start.
    pub warm_start_max: f64,
    /// Worst job slowdown after the search.
    pub search_max: f64,
    /// Search time.
    pub solve_time_ms: u64,
}

impl TrialResult {
    /// Relative reduction of the mean slowdown.
    pub fn mean_improvement(&self) -> f64 {
        relative_gain(self.warm_start_objective, self.search_objective)
    }

    /// Relative reduction of the worst slowdown.
    pub fn max_improvement(&self) -> f64 {
        relative_gain(self.warm_start_max, self.search_max)
    }
}

fn relative_gain(before: f64, after: f64) -> f64 {
    if before <= 0.0 {
        0.0
    } else {
        (before - after) / before
    }
}

/// Aggregate over all trials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchSummary {
    /// Trials run.
    pub trials: usize,
    /// Average relative reduction of the mean slowdown.
    pub mean_improvement: f64,
    /// Largest relative reduction of the mean slowdown.
    pub best_improvement: f64,
    /// Average relative reduction of the worst slowdown.
    pub mean_max_improvement: f64,
    /// Trials whose worst slowdown improved by more than [`NOTABLE_IMPROVEMENT`].
    pub notable: usize,
    /// Wall time for the whole run.
    pub total_time_ms: u64,
    /// Per-trial results in generation order.
    pub results: Vec<TrialResult>,
}

/// Random instance: every job uses a random nonempty subset of links with
/// compute in `[2, 6)` and communication in `[10, 20)`.
pub fn random_instance(
    rng: &mut ChaCha8Rng,
    jobs: usize,
    links: usize,
) -> ModelResult<DemandMatrix> {
    let mut cells = vec![LinkDemand::default(); jobs * links];
    for job in 0..jobs {
        let forced = rng.gen_range(0..links);
        for link in 0..links {
            if link == forced || rng.gen_bool(0.5) {
                cells[job * links + link] =
                    LinkDemand::new(rng.gen_range(2.0..6.0), rng.gen_range(10.0..20.0));
            }
        }
    }
    DemandMatrix::new(jobs, links, cells)
}

/// Solve one instance and score the warm start alongside.
pub fn run_trial(demand: &DemandMatrix, settings: &SearchSettings) -> SearchResult<TrialResult> {
    let root = warm_start(demand, settings.warm_start);
    let baseline = evaluate_priority(demand, &root, settings)?;
    let solution = solve(demand, settings)?;

    Ok(TrialResult {
        warm_start_objective: baseline.objective,
        search_objective: solution.objective,
        warm_start_max: baseline.job_slowdown.iter().copied().fold(0.0, f64::max),
        search_max: solution.max_slowdown(),
        solve_time_ms: solution.solve_time_ms,
    })
}

/// Run every trial and summarize.
pub fn run_bench(config: &BenchConfig, settings: &SearchSettings) -> SearchResult<BenchSummary> {
    if config.jobs == 0 || config.links == 0 {
        return Err(SearchError::InvalidSettings(
            "bench instances need at least one job and one link".to_string(),
        ));
    }

    let start = Instant::now();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut results = Vec::with_capacity(config.trials);

    for trial in 0..config.trials {
        let demand = random_instance(&mut rng, config.jobs, config.links)?;
        let result = run_trial(&demand, settings)?;

        if result.max_improvement() > NOTABLE_IMPROVEMENT {
            log::info!(
                "Trial {}: worst slowdown {:.4} -> {:.4} ({:.1}%)",
                trial,
                result.warm_start_max,
                result.search_max,
                100.0 * result.max_improvement()
            );
        }
        results.push(result);
    }

    let n = results.len().max(1) as f64;
    Ok(BenchSummary {
        trials: results.len(),
        mean_improvement: results.iter().map(TrialResult::mean_improvement).sum::<f64>() / n,
        best_improvement: results
            .iter()
            .map(TrialResult::mean_improvement)
            .fold(0.0, f64::max),
        mean_max_improvement: results.iter().map(TrialResult::max_improvement).sum::<f64>() / n,
        notable: results
            .iter()
            .filter(|r| r.max_improvement() > NOTABLE_IMPROVEMENT)
            .count(),
        total_time_ms: start.elapsed().as_millis() as u64,
        results,
    })
}
