//! Evaluation observers.
//!
//! A search reports every fresh objective evaluation to the observer it owns.
//! Nothing here affects the search itself.

use super::NodeId;

/// Receives every objective computed during one search.
pub trait EvaluationObserver {
    /// Called once per node, when its objective is first computed.
    fn on_evaluation(&mut self, node: NodeId, objective: f64);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl EvaluationObserver for NoopObserver {
    fn on_evaluation(&mut self, _node: NodeId, _objective: f64) {}
}

impl<F> EvaluationObserver for F
where
    F: FnMut(NodeId, f64),
{
    fn on_evaluation(&mut self, node: NodeId, objective: f64) {
        self(node, objective)
    }
}

/// Records objectives in evaluation order.
#[derive(Debug, Clone, Default)]
pub struct EvaluationTrace {
    /// `(node, objective)` pairs in the order they were computed.
    pub entries: Vec<(NodeId, f64)>,
}

impl EvaluationTrace {
    /// Empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of evaluations recorded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been evaluated.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lowest objective seen so far after each evaluation.
    pub fn running_best(&self) -> Vec<f64> {
        self.entries
            .iter()
            .scan(f64::INFINITY, |best, &(_, obj)| {
                *best = best.min(obj);
                Some(*best)
            })
            .collect()
    }
}

impl EvaluationObserver for EvaluationTrace {
    fn on_evaluation(&mut self, node: NodeId, objective: f64) {
        self.entries.push((node, objective));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_running_best() {
        let mut trace = EvaluationTrace::new();
        assert!(trace.is_empty());

        trace.on_evaluation(NodeId(0), 2.0);
        trace.on_evaluation(NodeId(1), 2.5);
        trace.on_evaluation(NodeId(2), 1.5);

        assert_eq!(trace.len(), 3);
        assert_eq!(trace.running_best(), vec![2.0, 2.0, 1.5]);
    }

    #[test]
    fn test_closure_observer() {
        let mut count = 0;
        {
            let mut observer = |_: NodeId, _: f64| count += 1;
            observer.on_evaluation(NodeId(0), 1.0);
            observer.on_evaluation(NodeId(1), 1.0);
        }
        assert_eq!(count, 2);
    }
}
