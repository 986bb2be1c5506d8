//! Search node representation.

use jfp_core::{
    evaluate, select_actions, DemandMatrix, ModelResult, PriorityMatrix, SwapAction,
};
use rand::Rng;

/// Keeps the UCT terms finite for unvisited children.
pub const EXPLORATION_EPS: f64 = 1e-6;

/// Index of a node in the search arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root is always the first node in the arena.
    pub const ROOT: NodeId = NodeId(0);

    /// Get the underlying index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Cached result of evaluating a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEvaluation {
    /// Mean slowdown of the node's priority matrix.
    pub objective: f64,

    /// Per-job slowdown.
    pub job_slowdown: Vec<f64>,

    /// Candidate swaps out of this node. Empty means terminal.
    pub actions: Vec<SwapAction>,

    /// Convergence epochs used.
    pub epochs_run: usize,
}

/// A node in the priority search tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Arena index of this node.
    pub id: NodeId,

    /// Swap that produced this node from its parent (None for root).
    pub action: Option<SwapAction>,

    /// Parent node (None for root). Only used to walk upward.
    pub parent: Option<NodeId>,

    /// Children in creation order.
    pub children: Vec<NodeId>,

    /// Depth in the tree (0 for root).
    pub depth: usize,

    /// Number of backpropagation passes through this node.
    pub visits: u64,

    /// Sum of objectives backpropagated through this node.
    pub value: f64,

    /// Greedy candidate count, inherited from the parent.
    pub max_children: usize,

    priority: PriorityMatrix,

    /// None until the objective has been computed.
    evaluation: Option<NodeEvaluation>,
}

impl Node {
    /// Create the root node.
    pub fn root(priority: PriorityMatrix, max_children: usize) -> Self {
        Self {
            id: NodeId::ROOT,
            action: None,
            parent: None,
            children: Vec::new(),
            depth: 0,
            visits: 0,
            value: 0.0,
            max_children,
            priority,
            evaluation: None,
        }
    }

    /// Create an unevaluated child by applying `action`.
    pub fn apply_action(&self, action: SwapAction, id: NodeId) -> ModelResult<Self> {
        Ok(Self {
            id,
            action: Some(action),
            parent: Some(self.id),
            children: Vec::new(),
            depth: self.depth + 1,
            visits: 0,
            value: 0.0,
            max_children: self.max_children,
            priority: self.priority.apply(&action)?,
            evaluation: None,
        })
    }

    /// Priority matrix of this state.
    pub fn priority(&self) -> &PriorityMatrix {
        &self.priority
    }

    /// Cached evaluation, if computed.
    pub fn evaluation(&self) -> Option<&NodeEvaluation> {
        self.evaluation.as_ref()
    }

    /// Cached objective, if computed.
    pub fn objective(&self) -> Option<f64> {
        self.evaluation.as_ref().map(|e| e.objective)
    }

    /// Terminal once evaluated with no candidate swaps; None while pending.
    pub fn is_terminal(&self) -> Option<bool> {
        self.evaluation.as_ref().map(|e| e.actions.is_empty())
    }

    /// Evaluate on first call and cache; later calls return the cache.
    ///
    /// The flag is true when this call ran the convergence model.
    pub fn ensure_evaluated<R: Rng + ?Sized>(
        &mut self,
        demand: &DemandMatrix,
        epoch_budget: usize,
        rng: &mut R,
    ) -> ModelResult<(&NodeEvaluation, bool)> {
        let (evaluation, fresh) = match self.evaluation.take() {
            Some(cached) => (cached, false),
            None => (self.compute(demand, epoch_budget, rng)?, true),
        };
        let evaluation: &NodeEvaluation = self.evaluation.insert(evaluation);
        Ok((evaluation, fresh))
    }

    /// Objective and candidate swaps, evaluating on first call.
    pub fn objective_and_actions<R: Rng + ?Sized>(
        &mut self,
        demand: &DemandMatrix,
        epoch_budget: usize,
        rng: &mut R,
    ) -> ModelResult<(f64, &[SwapAction])> {
        let (evaluation, _) = self.ensure_evaluated(demand, epoch_budget, rng)?;
        Ok((evaluation.objective, &evaluation.actions))
    }

    fn compute<R: Rng + ?Sized>(
        &self,
        demand: &DemandMatrix,
        epoch_budget: usize,
        rng: &mut R,
    ) -> ModelResult<NodeEvaluation> {
        let eval = evaluate(demand, &self.priority, epoch_budget)?;
        let actions = select_actions(
            &eval.desirability,
            demand,
            &self.priority,
            self.max_children,
            rng,
        )?;

        Ok(NodeEvaluation {
            objective: eval.objective,
            job_slowdown: eval.job_slowdown,
            actions,
            epochs_run: eval.epochs_run,
        })
    }

    /// Mean backpropagated value.
    pub fn mean_value(&self) -> f64 {
        self.value / (self.visits as f64 + EXPLORATION_EPS)
    }

    /// UCT score of this node as a child of a parent with `parent_visits`.
    pub fn uct_score(&self, parent_visits: u64) -> f64 {
        let exploration = (2.0 * (parent_visits as f64 + 1.0).ln()
            / (self.visits as f64 + EXPLORATION_EPS))
            .sqrt();
        self.mean_value() + exploration
    }

    /// Record one backpropagation pass.
    pub fn record(&mut self, reward: f64) {
        self.visits += 1;
        self.value += reward;
    }
}
