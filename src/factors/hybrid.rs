//! Hybrid Gaussian factors
//!
//! A [`HybridGaussianFactor`] holds one linear Gaussian factor per assignment
//! of its discrete keys, each paired with a scalar offset added to the
//! factor's error (a negative log scale). Offsets carry the normalization
//! constants produced by eliminating continuous variables out of a mixture.

use super::decision_tree::DecisionTree;
use super::gaussian::GaussianFactor;
use crate::inference::errors::{InferenceError, Result};
use crate::types::{DiscreteKey, DiscreteValues, Key, VectorValues};

/// Gaussian factor selected by a discrete assignment
#[derive(Debug, Clone, PartialEq)]
pub struct HybridGaussianFactor {
    continuous_keys: Vec<Key>,
    discrete_keys: Vec<DiscreteKey>,
    components: DecisionTree<(GaussianFactor, f64)>,
}

impl HybridGaussianFactor {
    /// One component per assignment of `discrete_keys`, in row-major order
    pub fn new(discrete_keys: Vec<DiscreteKey>, factors: Vec<GaussianFactor>) -> Result<Self> {
        Self::with_offsets(discrete_keys, factors.into_iter().map(|f| (f, 0.0)).collect())
    }

    /// Components with explicit error offsets
    pub fn with_offsets(
        discrete_keys: Vec<DiscreteKey>,
        components: Vec<(GaussianFactor, f64)>,
    ) -> Result<Self> {
        let components = DecisionTree::from_leaves(&discrete_keys, components)?;
        Self::from_tree(discrete_keys, components)
    }

    pub(crate) fn from_tree(
        discrete_keys: Vec<DiscreteKey>,
        components: DecisionTree<(GaussianFactor, f64)>,
    ) -> Result<Self> {
        let mut continuous_keys: Vec<Key> = Vec::new();
        for (factor, _) in components.leaves() {
            for &key in factor.keys() {
                if discrete_keys.iter().any(|d| d.key == key) {
                    return Err(InferenceError::InvalidOrdering {
                        description: format!("key {} is both continuous and discrete", key),
                    });
                }
                if !continuous_keys.contains(&key) {
                    continuous_keys.push(key);
                }
            }
        }
        Ok(Self {
            continuous_keys,
            discrete_keys,
            components,
        })
    }

    /// Continuous keys across all components
    pub fn continuous_keys(&self) -> &[Key] {
        &self.continuous_keys
    }

    /// Discrete keys selecting the component
    pub fn discrete_keys(&self) -> &[DiscreteKey] {
        &self.discrete_keys
    }

    /// All keys, continuous first
    pub fn keys(&self) -> Vec<Key> {
        self.continuous_keys
            .iter()
            .copied()
            .chain(self.discrete_keys.iter().map(|k| k.key))
            .collect()
    }

    /// Whether the factor involves a key
    pub fn involves(&self, key: Key) -> bool {
        self.continuous_keys.contains(&key) || self.discrete_keys.iter().any(|k| k.key == key)
    }

    /// Component tree
    pub fn components(&self) -> &DecisionTree<(GaussianFactor, f64)> {
        &self.components
    }

    /// Gaussian factor and offset for an assignment
    pub fn component(&self, assignment: &DiscreteValues) -> Result<(&GaussianFactor, f64)> {
        let (factor, offset) = self.components.get(assignment)?;
        Ok((factor, *offset))
    }

    /// Dimension of a continuous key, from the first component that has it
    pub fn dim_of(&self, key: Key) -> Option<usize> {
        self.components
            .leaves()
            .into_iter()
            .find_map(|(f, _)| f.dim_of(key))
    }

    /// Error of the selected component plus its offset
    pub fn error(&self, values: &VectorValues, assignment: &DiscreteValues) -> Result<f64> {
        let (factor, offset) = self.component(assignment)?;
        Ok(factor.error(values)? + offset)
    }

    /// Same keys and components within `tol`
    pub fn equals(&self, other: &HybridGaussianFactor, tol: f64) -> bool {
        self.continuous_keys == other.continuous_keys
            && self.discrete_keys == other.discrete_keys
            && self.components.equals_with(&other.components, &|a, b| {
                a.0.equals(&b.0, tol) && (a.1 - b.1).abs() <= tol
            })
    }
}
