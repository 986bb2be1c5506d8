//! Priority search for the JFP link sharing model.
//!
//! Starts from a warm-start priority matrix and runs a UCT tree search over
//! single swaps of adjacent jobs on one link, keeping the matrix with the
//! lowest mean slowdown seen.
//!
//! # Example
//!
//! ```
//! use jfp_core::DemandMatrix;
//! use jfp_search::{solve, SearchSettings};
//!
//! let demand = DemandMatrix::from_rows(&[
//!     vec![(1.0, 3.0), (0.0, 0.0)],
//!     vec![(1.0, 8.0), (0.0, 1.0)],
//!     vec![(0.0, 0.0), (1.0, 3.0)],
//! ])?;
//!
//! let solution = solve(&demand, &SearchSettings::default().with_iterations(20))?;
//! assert!(solution.objective <= solution.warm_start_objective);
//! # Ok::<(), jfp_search::SearchError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod model;
pub mod search;
pub mod settings;

use jfp_core::{evaluate, warm_start, DemandMatrix, Evaluation, PriorityMatrix};

pub use error::{SearchError, SearchResult};
pub use model::Solution;
pub use search::{
    EvaluationObserver, EvaluationTrace, Node, NodeEvaluation, NodeId, NoopObserver, TreeSearch,
    TreeStats, EXPLORATION_EPS,
};
pub use settings::SearchSettings;

/// Search for a low-slowdown priority matrix.
pub fn solve(demand: &DemandMatrix, settings: &SearchSettings) -> SearchResult<Solution> {
    solve_with_observer(demand, settings, NoopObserver).map(|(solution, _)| solution)
}

/// Like [`solve`], reporting every objective evaluation to `observer`.
///
/// Returns the observer alongside the solution.
pub fn solve_with_observer<O: EvaluationObserver>(
    demand: &DemandMatrix,
    settings: &SearchSettings,
    observer: O,
) -> SearchResult<(Solution, O)> {
    settings.validate()?;
    demand.validate()?;

    let root = warm_start(demand, settings.warm_start);
    let mut tree = TreeSearch::with_observer(demand, root, settings.clone(), observer)?;
    tree.run()?;

    let solution = tree.finalize()?;
    if settings.verbose {
        log::info!(
            "Search finished: objective {:.6} (warm start {:.6}, {:.1}% better) at depth {} after {} iterations in {} ms",
            solution.objective,
            solution.warm_start_objective,
            100.0 * solution.improvement(),
            solution.best_depth,
            solution.iterations,
            solution.solve_time_ms,
        );
    }

    Ok((solution, tree.into_observer()))
}

/// Score a caller-supplied priority matrix without searching.
pub fn evaluate_priority(
    demand: &DemandMatrix,
    priority: &PriorityMatrix,
    settings: &SearchSettings,
) -> SearchResult<Evaluation> {
    settings.validate()?;
    Ok(evaluate(demand, priority, settings.epoch_budget)?)
}
