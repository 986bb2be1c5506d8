//! JFP core: strict-priority link sharing model.
//!
//! A set of jobs share bottleneck links. Each job needs some compute time and
//! some communication on every link it touches, and on each link jobs are
//! served in strict priority order. This crate provides:
//!
//! - **Problem data**: [`DemandMatrix`] and [`PriorityMatrix`], plus the
//!   [`SwapAction`] that moves one job a single rank forward on one link
//! - **Convergence model**: [`evaluate`] simulates the sharing to a fixed
//!   point and reports the mean slowdown and a per-cell swap desirability
//! - **Candidate selection**: [`select_actions`] turns desirability into a
//!   small, diversified set of swaps worth trying
//! - **Warm start**: [`warm_start`] sorts jobs per link to seed a search
//!
//! # Example
//!
//! ```
//! use jfp_core::{evaluate, warm_start, DemandMatrix, WarmStart, DEFAULT_EPOCH_BUDGET};
//!
//! let demand = DemandMatrix::from_rows(&[
//!     vec![(1.0, 3.0), (0.0, 0.0)],
//!     vec![(1.0, 8.0), (0.0, 1.0)],
//!     vec![(0.0, 0.0), (1.0, 3.0)],
//! ])?;
//!
//! let priority = warm_start(&demand, WarmStart::LinkCommRatio);
//! let eval = evaluate(&demand, &priority, DEFAULT_EPOCH_BUDGET)?;
//! assert!(eval.objective >= 1.0);
//! # Ok::<(), jfp_core::ModelError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod candidates;
pub mod convergence;
pub mod error;
pub mod problem;
pub mod warm_start;

pub use candidates::{pair_with_peers, select_actions, select_cells};
pub use convergence::{evaluate, Evaluation, SwapDesirability, CONVERGENCE_TOL, DEFAULT_EPOCH_BUDGET};
pub use error::{ModelError, ModelResult};
pub use problem::{DemandMatrix, LinkDemand, Position, PriorityMatrix, SwapAction};
pub use warm_start::{warm_start, WarmStart};
