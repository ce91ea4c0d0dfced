//! Resolving a hybrid Bayes tree under a discrete assignment

use std::collections::HashSet;

use super::bayes_tree::BayesTree;
use crate::conditionals::Conditional;
use crate::inference::errors::Result;
use crate::inference::GaussianBayesNet;
use crate::types::{DiscreteValues, Key, VectorValues};

impl BayesTree {
    /// Gaussian Bayes net selected by a discrete assignment
    ///
    /// Mixture cliques contribute the branch matching `assignment`, Gaussian
    /// cliques contribute their conditional and discrete cliques contribute
    /// nothing. Each variable's conditional is emitted once, whatever order
    /// the cliques are visited in.
    ///
    /// # Errors
    /// [`InferenceError::UnknownKey`](crate::inference::InferenceError::UnknownKey)
    /// if `assignment` lacks a discrete key a mixture branches on.
    pub fn choose(&self, assignment: &DiscreteValues) -> Result<GaussianBayesNet> {
        let mut seen: HashSet<Key> = HashSet::new();
        let mut net = GaussianBayesNet::new();
        for (_, clique) in self.cliques() {
            let frontals = clique.frontals();
            if frontals.iter().all(|k| seen.contains(k)) {
                continue;
            }
            match clique.conditional() {
                Conditional::Gaussian(c) => net.push(c.clone()),
                Conditional::Hybrid(mixture) => net.push(mixture.choose(assignment)?.clone()),
                Conditional::Discrete(_) => {}
            }
            seen.extend(frontals);
        }
        Ok(net)
    }

    /// Continuous solution under a discrete assignment
    ///
    /// Back-substitutes the net returned by [`BayesTree::choose`].
    pub fn optimize(&self, assignment: &DiscreteValues) -> Result<VectorValues> {
        self.choose(assignment)?.optimize()
    }
}
