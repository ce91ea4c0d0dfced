//! Incremental smoothing over a Bayes tree
//!
//! [`Isam`] keeps a [`BayesTree`] up to date as new factors arrive. Each
//! [`Isam::update`] removes the top of the tree above the variables touched
//! by the new factors, re-eliminates the freed conditionals together with
//! the new factors, inserts the result and hangs the untouched subtrees back
//! below it.
//!
//! An update runs in two phases:
//!
//! - **plan**: select the cliques to remove, convert them to factors, choose
//!   an ordering and eliminate. Nothing is modified, so any error here leaves
//!   the tree exactly as it was.
//! - **commit**: detach the old top, insert the new conditionals and
//!   reattach orphans. A failure here leaves a half-built tree; the updater
//!   marks itself invalid and refuses further work.

use serde::{Deserialize, Serialize};

use crate::factors::FactorGraph;
use crate::inference::{
    eliminate, BayesNet, GaussianBayesNet, InferenceError, IsamConfig, Ordering, Result,
};
use crate::reporter::{NoOpReporter, UpdateReporter};
use crate::tree::{BayesTree, Orphans};
use crate::types::{DiscreteValues, Key, VectorValues};

// ============================================================================
// UpdateResult
// ============================================================================

/// Statistics of one incremental update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    /// Variables touched by the new factors
    pub contaminated: usize,
    /// Cliques removed from the top of the tree
    pub removed_cliques: usize,
    /// Subtrees detached and reattached
    pub orphans: usize,
    /// Conditionals produced by re-elimination
    pub new_conditionals: usize,
    /// Cliques in the tree after the update
    pub cliques: usize,
    /// Variables in the tree after the update
    pub variables: usize,
}

impl UpdateResult {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

// ============================================================================
// Isam
// ============================================================================

/// Incremental updater owning a Bayes tree
#[derive(Debug, Clone)]
pub struct Isam {
    tree: BayesTree,
    config: IsamConfig,
    valid: bool,
}

impl Isam {
    /// Create an updater with an empty tree.
    pub fn new(config: IsamConfig) -> Self {
        Self::from_tree(BayesTree::new(), config)
    }

    /// Continue from an existing tree.
    pub fn from_tree(tree: BayesTree, config: IsamConfig) -> Self {
        Self {
            tree,
            config,
            valid: true,
        }
    }

    /// Eliminate `graph` in batch with the configured ordering policy.
    pub fn from_graph(graph: &FactorGraph, config: IsamConfig) -> Result<Self> {
        let ordering = Ordering::from_policy(graph, config.ordering)?;
        Self::from_graph_with_ordering(graph, &ordering, config)
    }

    /// Eliminate `graph` in batch with an explicit ordering.
    pub fn from_graph_with_ordering(
        graph: &FactorGraph,
        ordering: &Ordering,
        config: IsamConfig,
    ) -> Result<Self> {
        let net = eliminate(graph, ordering, &config.elimination)?;
        let tree = BayesTree::from_bayes_net(net)?;
        Ok(Self::from_tree(tree, config))
    }

    /// Current tree
    pub fn tree(&self) -> &BayesTree {
        &self.tree
    }

    /// Configuration
    pub fn config(&self) -> &IsamConfig {
        &self.config
    }

    /// Whether the tree can still be used
    ///
    /// Becomes `false` when an update fails after it started modifying the
    /// tree.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Drop the tree and start over from an empty one.
    pub fn reset(&mut self) {
        self.tree = BayesTree::new();
        self.valid = true;
    }

    /// Consume the updater and return its tree.
    pub fn into_tree(self) -> BayesTree {
        self.tree
    }

    /// Add factors and update the tree.
    ///
    /// # Errors
    /// - [`InferenceError::InvalidatedTree`] if an earlier update broke the tree
    /// - ordering and numeric errors from re-elimination; the tree is untouched
    /// - [`InferenceError::Structural`] if the new cliques cannot be linked;
    ///   the updater is invalidated
    pub fn update(&mut self, new_factors: FactorGraph) -> Result<UpdateResult> {
        self.update_with_reporter(new_factors, &mut NoOpReporter)
    }

    /// Add factors and update the tree, reporting each phase.
    pub fn update_with_reporter<R: UpdateReporter>(
        &mut self,
        new_factors: FactorGraph,
        reporter: &mut R,
    ) -> Result<UpdateResult> {
        let outcome = self.update_internal(new_factors, reporter);
        match &outcome {
            Ok(result) => reporter.on_update_complete(result),
            Err(err) => reporter.on_update_failed(err),
        }
        outcome
    }

    fn update_internal<R: UpdateReporter>(
        &mut self,
        new_factors: FactorGraph,
        reporter: &mut R,
    ) -> Result<UpdateResult> {
        if !self.valid {
            return Err(InferenceError::InvalidatedTree);
        }

        // Plan
        let contaminated: Vec<Key> = new_factors.keys().into_iter().collect();
        let plan = self.tree.plan_top(&contaminated);
        let mut combined = self.tree.freed_factors(&plan)?;
        reporter.on_remove_top(plan.removed().len(), plan.orphans().len(), &combined);
        log::debug!(
            "update: {} new factors over {} keys, removing {} cliques",
            new_factors.len(),
            contaminated.len(),
            plan.removed().len()
        );

        combined.extend(new_factors);
        if combined.is_empty() {
            return Ok(self.result(contaminated.len(), 0, 0, 0));
        }

        let ordering = Ordering::from_policy(&combined, self.config.ordering)?;
        reporter.on_ordering(&ordering);
        let net = eliminate(&combined, &ordering, &self.config.elimination)?;
        reporter.on_eliminated(&net);

        // Commit
        let removed = plan.removed().len();
        let new_conditionals = net.len();
        let orphans = self.tree.detach(plan);
        let orphan_count = orphans.len();
        if let Err(err) = self.commit(net, orphans) {
            log::debug!("update failed during commit, tree invalidated: {}", err);
            self.valid = false;
            return Err(err);
        }

        Ok(self.result(contaminated.len(), removed, orphan_count, new_conditionals))
    }

    fn commit(&mut self, net: BayesNet, orphans: Orphans) -> Result<()> {
        for conditional in net.into_conditionals().into_iter().rev() {
            self.tree.insert(conditional)?;
        }
        self.tree.reattach(orphans)?;
        if self.config.check_invariants {
            self.tree.check_invariants()?;
        }
        Ok(())
    }

    fn result(
        &self,
        contaminated: usize,
        removed_cliques: usize,
        orphans: usize,
        new_conditionals: usize,
    ) -> UpdateResult {
        UpdateResult {
            contaminated,
            removed_cliques,
            orphans,
            new_conditionals,
            cliques: self.tree.len(),
            variables: self.tree.num_variables(),
        }
    }

    /// Gaussian Bayes net selected by a discrete assignment
    ///
    /// See [`BayesTree::choose`].
    pub fn choose(&self, assignment: &DiscreteValues) -> Result<GaussianBayesNet> {
        self.ensure_valid()?;
        self.tree.choose(assignment)
    }

    /// Continuous solution under a discrete assignment
    ///
    /// Pass an empty assignment for a purely Gaussian tree.
    pub fn optimize(&self, assignment: &DiscreteValues) -> Result<VectorValues> {
        self.ensure_valid()?;
        self.tree.optimize(assignment)
    }

    fn ensure_valid(&self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(InferenceError::InvalidatedTree)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::{GaussianFactor, NoiseModel};
    use crate::inference::OrderingPolicy;
    use nalgebra::{dvector, DMatrix};

    fn natural() -> IsamConfig {
        IsamConfig::default()
            .with_ordering(OrderingPolicy::Natural)
            .with_check_invariants(true)
    }

    /// Prior on x1 and x1 - x2 = 1
    fn chain() -> FactorGraph {
        let mut graph = FactorGraph::new();
        graph.push(GaussianFactor::prior(1, dvector![0.0], 1.0));
        graph.push(GaussianFactor::between(1, 2, dvector![1.0], 1.0));
        graph
    }

    #[test]
    fn test_update_extends_chain() {
        let mut isam =
            Isam::from_graph_with_ordering(&chain(), &Ordering::from_keys([1, 2]), natural())
                .unwrap();
        assert_eq!(isam.tree().len(), 2);
        let x1_clique = isam.tree().find(1).unwrap();

        let mut graph = FactorGraph::new();
        graph.push(GaussianFactor::between(2, 3, dvector![1.0], 1.0));
        let result = isam.update(graph).unwrap();

        assert_eq!(result.contaminated, 2);
        assert_eq!(result.removed_cliques, 1);
        assert_eq!(result.orphans, 1);
        assert_eq!(result.variables, 3);
        assert_eq!(isam.tree().find(1), Some(x1_clique));
        isam.tree().check_invariants().unwrap();

        let x = isam.optimize(&DiscreteValues::new()).unwrap();
        assert!((x.get(3).unwrap()[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_update_on_tree_with_distant_separator_owner() {
        use crate::conditionals::GaussianConditional;
        let unit = |frontal: Key, parents: &[Key]| {
            GaussianConditional::new(
                vec![(frontal, 1)],
                DMatrix::identity(1, 1),
                parents.iter().map(|&p| (p, DMatrix::identity(1, 1))).collect(),
                dvector![0.0],
                dvector![1.0],
            )
            .unwrap()
        };
        // x4 | {x3, x1} hangs below x3, two levels under x1
        let mut tree = BayesTree::new();
        tree.insert(unit(1, &[])).unwrap();
        tree.insert(unit(2, &[1])).unwrap();
        tree.insert(unit(3, &[2])).unwrap();
        tree.insert(unit(4, &[3, 1])).unwrap();

        let mut isam = Isam::from_tree(tree, natural());
        let mut graph = FactorGraph::new();
        graph.push(GaussianFactor::prior(9, dvector![1.0], 1.0));
        let result = isam.update(graph).unwrap();
        assert_eq!(result.removed_cliques, 0);
        assert_eq!(result.cliques, 5);
        assert!(isam.is_valid());
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut isam = Isam::from_graph(&chain(), natural()).unwrap();
        let before = isam.tree().clone();
        let result = isam.update(FactorGraph::new()).unwrap();
        assert_eq!(result.removed_cliques, 0);
        assert_eq!(result.new_conditionals, 0);
        assert!(isam.tree().equals(&before, 0.0));
    }

    #[test]
    fn test_failed_elimination_keeps_tree() {
        let mut graph = FactorGraph::new();
        graph.push(
            GaussianFactor::unary(1, DMatrix::identity(1, 1), dvector![0.0], NoiseModel::constrained_all(1))
                .unwrap(),
        );
        let mut isam = Isam::from_graph(&graph, natural()).unwrap();
        let before = isam.tree().clone();

        let mut conflicting = FactorGraph::new();
        conflicting.push(
            GaussianFactor::unary(1, DMatrix::identity(1, 1), dvector![1.0], NoiseModel::constrained_all(1))
                .unwrap(),
        );
        let err = isam.update(conflicting).unwrap_err();
        assert!(matches!(err, InferenceError::NumericDegeneracy { key: 1, .. }));
        assert!(isam.is_valid());
        assert!(isam.tree().equals(&before, 0.0));
    }

    #[test]
    fn test_invalidated_updater_refuses_work() {
        let mut isam = Isam::from_graph(&chain(), natural()).unwrap();
        isam.valid = false;
        assert_eq!(
            isam.update(chain()).unwrap_err(),
            InferenceError::InvalidatedTree
        );
        assert_eq!(
            isam.optimize(&DiscreteValues::new()).unwrap_err(),
            InferenceError::InvalidatedTree
        );
        isam.reset();
        assert!(isam.is_valid());
        assert!(isam.tree().is_empty());
    }

    #[test]
    fn test_update_result_serializes() {
        let result = UpdateResult {
            contaminated: 2,
            removed_cliques: 1,
            orphans: 1,
            new_conditionals: 2,
            cliques: 3,
            variables: 3,
        };
        let back: UpdateResult = serde_json::from_str(&result.to_json()).unwrap();
        assert_eq!(back, result);
    }
}
