//! Gaussian mixture conditionals
//!
//! `p(x_F | x_S, m)` with one [`GaussianConditional`] per assignment of the
//! discrete parents `m`. Every branch shares the same frontal and continuous
//! parent keys.

use super::gaussian::GaussianConditional;
use crate::factors::{DecisionTree, HybridGaussianFactor};
use crate::inference::errors::{InferenceError, Result};
use crate::types::{DiscreteKey, DiscreteValues, Key};

/// Gaussian conditional selected by discrete parents
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianMixture {
    frontals: Vec<Key>,
    continuous_parents: Vec<Key>,
    discrete_parents: Vec<DiscreteKey>,
    conditionals: DecisionTree<GaussianConditional>,
}

impl GaussianMixture {
    /// One conditional per assignment of `discrete_parents`, in row-major order
    pub fn new(
        discrete_parents: Vec<DiscreteKey>,
        conditionals: Vec<GaussianConditional>,
    ) -> Result<Self> {
        let tree = DecisionTree::from_leaves(&discrete_parents, conditionals)?;
        Self::from_tree(discrete_parents, tree)
    }

    pub(crate) fn from_tree(
        discrete_parents: Vec<DiscreteKey>,
        conditionals: DecisionTree<GaussianConditional>,
    ) -> Result<Self> {
        let leaves = conditionals.leaves();
        let first = leaves.first().ok_or(InferenceError::InvalidOrdering {
            description: "mixture without branches".to_string(),
        })?;
        let frontals = first.frontals().to_vec();
        let continuous_parents = first.parents().to_vec();
        for branch in &leaves[1..] {
            if branch.frontals() != frontals.as_slice()
                || branch.parents() != continuous_parents.as_slice()
            {
                return Err(InferenceError::InvalidOrdering {
                    description: "mixture branches disagree on their keys".to_string(),
                });
            }
        }
        Ok(Self {
            frontals,
            continuous_parents,
            discrete_parents,
            conditionals,
        })
    }

    /// Frontal keys
    pub fn frontals(&self) -> &[Key] {
        &self.frontals
    }

    /// Continuous parent keys
    pub fn continuous_parents(&self) -> &[Key] {
        &self.continuous_parents
    }

    /// Discrete parent keys
    pub fn discrete_parents(&self) -> &[DiscreteKey] {
        &self.discrete_parents
    }

    /// Branch tree
    pub fn conditionals(&self) -> &DecisionTree<GaussianConditional> {
        &self.conditionals
    }

    /// Branch selected by an assignment of the discrete parents
    pub fn choose(&self, assignment: &DiscreteValues) -> Result<&GaussianConditional> {
        self.conditionals.get(assignment)
    }

    /// The mixture as a hybrid factor
    ///
    /// Each branch carries offset `-log|det R̃|` so that branch errors are
    /// comparable as negative log-densities.
    pub fn to_factor(&self) -> Result<HybridGaussianFactor> {
        let components = self.conditionals.map(&|c: &GaussianConditional| {
            (c.to_factor(), -c.log_determinant())
        });
        HybridGaussianFactor::from_tree(self.discrete_parents.clone(), components)
    }

    /// Same keys and branches within `tol`
    pub fn equals(&self, other: &GaussianMixture, tol: f64) -> bool {
        self.frontals == other.frontals
            && self.continuous_parents == other.continuous_parents
            && self.discrete_parents == other.discrete_parents
            && self
                .conditionals
                .equals_with(&other.conditionals, &|a, b| a.equals(b, tol))
    }
}
