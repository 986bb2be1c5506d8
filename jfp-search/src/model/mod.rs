//! Solution types for the priority search.

mod solution;

pub use solution::Solution;
