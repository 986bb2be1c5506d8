//! Tree search controller.

use std::time::Instant;

use jfp_core::{DemandMatrix, PriorityMatrix, SwapAction};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::{EvaluationObserver, Node, NodeEvaluation, NodeId, NoopObserver};
use crate::error::{SearchError, SearchResult};
use crate::model::Solution;
use crate::settings::SearchSettings;

/// UCT tree search over priority matrices.
///
/// Owns the node arena, the sampling rng and the evaluation observer. The
/// demand matrix is borrowed read-only and shared by every node.
pub struct TreeSearch<'a, O: EvaluationObserver = NoopObserver> {
    /// Demand being solved.
    demand: &'a DemandMatrix,

    /// Node arena; the root is at index 0.
    nodes: Vec<Node>,

    /// Candidate sampling rng.
    rng: ChaCha8Rng,

    /// Receives every fresh evaluation.
    observer: O,

    /// Convergence model runs.
    evaluations: u64,

    /// Iterations completed.
    iterations_run: u64,

    /// Start time.
    start_time: Option<Instant>,

    /// Settings.
    settings: SearchSettings,
}

impl<'a> TreeSearch<'a, NoopObserver> {
    /// Create a search rooted at `root_priority`.
    pub fn new(
        demand: &'a DemandMatrix,
        root_priority: PriorityMatrix,
        settings: SearchSettings,
    ) -> SearchResult<Self> {
        Self::with_observer(demand, root_priority, settings, NoopObserver)
    }
}

impl<'a, O: EvaluationObserver> TreeSearch<'a, O> {
    /// Create a search that reports evaluations to `observer`.
    pub fn with_observer(
        demand: &'a DemandMatrix,
        root_priority: PriorityMatrix,
        settings: SearchSettings,
        observer: O,
    ) -> SearchResult<Self> {
        settings.validate()?;
        demand.validate()?;
        root_priority.validate(demand)?;

        let capacity = (settings.iterations as usize).saturating_mul(2).min(1 << 16) + 1;
        let mut nodes = Vec::with_capacity(capacity);
        nodes.push(Node::root(root_priority, settings.max_children));

        Ok(Self {
            demand,
            nodes,
            rng: ChaCha8Rng::seed_from_u64(settings.seed),
            observer,
            evaluations: 0,
            iterations_run: 0,
            start_time: None,
            settings,
        })
    }

    /// Evaluate the root, then run the full iteration budget.
    pub fn run(&mut self) -> SearchResult<()> {
        self.start_time = Some(Instant::now());
        self.ensure_evaluated(NodeId::ROOT)?;

        for _ in 0..self.settings.iterations {
            self.step()?;
            self.log_progress();
        }

        Ok(())
    }

    /// One iteration: selection, expansion, evaluation, backpropagation.
    pub fn step(&mut self) -> SearchResult<NodeId> {
        let mut node = NodeId::ROOT;

        // Selection
        while !self.nodes[node.0].children.is_empty() && !self.is_terminal(node)? {
            node = self.select(node)?;
        }

        // Expansion
        if !self.is_terminal(node)? {
            node = self.expand(node)?;
        }

        // Evaluation
        let reward = self.ensure_evaluated(node)?.objective;

        // Backpropagation
        self.backpropagate(node, reward);

        self.iterations_run += 1;
        Ok(node)
    }

    /// Child of `id` with the highest UCT score; ties go to the first child.
    pub fn select(&self, id: NodeId) -> SearchResult<NodeId> {
        let parent = &self.nodes[id.0];

        let mut best: Option<(NodeId, f64)> = None;
        for &child in &parent.children {
            let score = self.nodes[child.0].uct_score(parent.visits);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((child, score));
            }
        }

        best.map(|(child, _)| child).ok_or_else(|| {
            SearchError::InternalError(format!("node {} has no children to select", id.0))
        })
    }

    /// Add a child for every candidate swap not already among the children.
    ///
    /// Returns the first new child, or `id` itself if nothing was added.
    pub fn expand(&mut self, id: NodeId) -> SearchResult<NodeId> {
        let actions = self.ensure_evaluated(id)?.actions.clone();
        let existing: Vec<SwapAction> = self.nodes[id.0]
            .children
            .iter()
            .filter_map(|&c| self.nodes[c.0].action)
            .collect();

        let mut first_new = None;
        for action in actions {
            if existing.contains(&action) {
                continue;
            }

            let child_id = NodeId(self.nodes.len());
            let child = self.nodes[id.0].apply_action(action, child_id)?;
            self.nodes.push(child);
            self.nodes[id.0].children.push(child_id);
            first_new.get_or_insert(child_id);
        }

        Ok(first_new.unwrap_or(id))
    }

    /// Add `reward` to every node from `id` up to the root.
    pub fn backpropagate(&mut self, id: NodeId, reward: f64) {
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = &mut self.nodes[cur.0];
            node.record(reward);
            current = node.parent;
        }
    }

    /// Evaluate `id` if needed and return its cached evaluation.
    pub fn ensure_evaluated(&mut self, id: NodeId) -> SearchResult<&NodeEvaluation> {
        let node = &mut self.nodes[id.0];
        let depth = node.depth;
        let (evaluation, fresh) =
            node.ensure_evaluated(self.demand, self.settings.epoch_budget, &mut self.rng)?;

        if fresh {
            self.evaluations += 1;
            self.observer.on_evaluation(id, evaluation.objective);
            log::debug!(
                "node {} (depth {}): objective {:.6}, {} candidates",
                id.0,
                depth,
                evaluation.objective,
                evaluation.actions.len()
            );
        }

        Ok(evaluation)
    }

    fn is_terminal(&mut self, id: NodeId) -> SearchResult<bool> {
        Ok(self.ensure_evaluated(id)?.actions.is_empty())
    }

    /// Node with the lowest objective among the root and all visited nodes.
    ///
    /// Walks the whole tree from the root; the first node found wins ties.
    pub fn best(&self) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        let mut stack = vec![NodeId::ROOT];

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];

            if id == NodeId::ROOT || node.visits > 0 {
                if let Some(obj) = node.objective() {
                    if best.map_or(true, |(_, b)| obj < b) {
                        best = Some((id, obj));
                    }
                }
            }

            stack.extend(node.children.iter().rev());
        }

        best.map(|(id, _)| id)
    }

    /// Build the solution from the best node.
    pub fn finalize(&self) -> SearchResult<Solution> {
        let best_id = self.best().ok_or_else(|| {
            SearchError::InternalError("root has not been evaluated".to_string())
        })?;
        let best = &self.nodes[best_id.0];
        let evaluation = best.evaluation().ok_or_else(|| {
            SearchError::InternalError(format!("best node {} is not evaluated", best_id.0))
        })?;

        let mut priority = best.priority().clone();
        priority.clear_inactive(self.demand);

        Ok(Solution {
            priority,
            objective: evaluation.objective,
            job_slowdown: evaluation.job_slowdown.clone(),
            warm_start_objective: self.root().objective().unwrap_or(evaluation.objective),
            best_node: best_id,
            best_depth: best.depth,
            best_visits: best.visits,
            iterations: self.iterations_run,
            nodes_created: self.nodes.len(),
            evaluations: self.evaluations,
            solve_time_ms: self.elapsed_ms(),
        })
    }

    /// Root node.
    pub fn root(&self) -> &Node {
        &self.nodes[NodeId::ROOT.0]
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Number of nodes created.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists from construction.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The evaluation observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Consume the search, returning its observer.
    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Get elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    /// Log progress (if verbose).
    pub fn log_progress(&self) {
        if !self.settings.verbose {
            return;
        }

        if self.iterations_run % self.settings.log_freq != 0 {
            return;
        }

        let stats = self.stats();
        log::info!(
            "Iter: {} | Nodes: {} | Evals: {} | Best: {:.6} | Root: {:.6} | Depth: {} | Time: {:.1}s",
            stats.iterations,
            stats.nodes,
            stats.evaluations,
            stats.best_objective,
            stats.root_objective,
            stats.max_depth,
            stats.elapsed_ms as f64 / 1000.0,
        );
    }

    /// Get statistics for display.
    pub fn stats(&self) -> TreeStats {
        let best_objective = self
            .best()
            .and_then(|id| self.nodes[id.0].objective())
            .unwrap_or(f64::INFINITY);

        TreeStats {
            iterations: self.iterations_run,
            nodes: self.nodes.len(),
            evaluations: self.evaluations,
            best_objective,
            root_objective: self.root().objective().unwrap_or(f64::INFINITY),
            max_depth: self.nodes.iter().map(|n| n.depth).max().unwrap_or(0),
            elapsed_ms: self.elapsed_ms(),
        }
    }
}

/// Statistics from the search tree.
#[derive(Debug, Clone)]
pub struct TreeStats {
    /// Iterations completed.
    pub iterations: u64,
    /// Nodes created.
    pub nodes: usize,
    /// Convergence model runs.
    pub evaluations: u64,
    /// Best objective so far.
    pub best_objective: f64,
    /// Objective of the warm-start root.
    pub root_objective: f64,
    /// Deepest node created.
    pub max_depth: usize,
    /// Elapsed time in milliseconds.
    pub elapsed_ms: u64,
}
