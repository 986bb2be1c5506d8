//! UCT tree search over priority matrices.

mod node;
mod observer;
mod tree;

pub use node::{Node, NodeEvaluation, NodeId, EXPLORATION_EPS};
pub use observer::{EvaluationObserver, EvaluationTrace, NoopObserver};
pub use tree::{TreeSearch, TreeStats};
