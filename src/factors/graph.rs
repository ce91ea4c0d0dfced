//! Factor graph container

use std::collections::{BTreeMap, BTreeSet};

use super::Factor;
use crate::inference::errors::{InferenceError, Result};
use crate::types::Key;

/// Collection of factors over a set of variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactorGraph {
    factors: Vec<Factor>,
}

impl FactorGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a factor
    pub fn push(&mut self, factor: impl Into<Factor>) {
        self.factors.push(factor.into());
    }

    /// Append every factor of another graph
    pub fn extend(&mut self, other: FactorGraph) {
        self.factors.extend(other.factors);
    }

    /// Factors in insertion order
    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Iterate over factors
    pub fn iter(&self) -> std::slice::Iter<'_, Factor> {
        self.factors.iter()
    }

    /// Number of factors
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Whether the graph has no factors
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Union of all keys touched by any factor
    pub fn keys(&self) -> BTreeSet<Key> {
        self.factors.iter().flat_map(|f| f.keys()).collect()
    }

    /// Cardinality of every discrete key
    pub fn discrete_cardinalities(&self) -> Result<BTreeMap<Key, usize>> {
        let mut out = BTreeMap::new();
        for factor in &self.factors {
            for dk in factor.discrete_keys() {
                if let Some(&card) = out.get(&dk.key) {
                    if card != dk.cardinality {
                        return Err(InferenceError::DimensionMismatch {
                            key: dk.key,
                            expected: card,
                            actual: dk.cardinality,
                        });
                    }
                }
                out.insert(dk.key, dk.cardinality);
            }
        }
        let continuous: BTreeSet<Key> = self
            .factors
            .iter()
            .flat_map(|f| f.continuous_keys().iter().copied())
            .collect();
        if let Some(key) = out.keys().find(|k| continuous.contains(k)) {
            return Err(InferenceError::InvalidOrdering {
                description: format!("key {} is used as both continuous and discrete", key),
            });
        }
        Ok(out)
    }

    /// Whether a key is discrete in any factor
    pub fn is_discrete(&self, key: Key) -> bool {
        self.factors
            .iter()
            .any(|f| f.discrete_keys().iter().any(|d| d.key == key))
    }

    /// Consume the graph into its factors
    pub fn into_factors(self) -> Vec<Factor> {
        self.factors
    }
}

impl FromIterator<Factor> for FactorGraph {
    fn from_iter<I: IntoIterator<Item = Factor>>(iter: I) -> Self {
        Self {
            factors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FactorGraph {
    type Item = Factor;
    type IntoIter = std::vec::IntoIter<Factor>;

    fn into_iter(self) -> Self::IntoIter {
        self.factors.into_iter()
    }
}

impl<'a> IntoIterator for &'a FactorGraph {
    type Item = &'a Factor;
    type IntoIter = std::slice::Iter<'a, Factor>;

    fn into_iter(self) -> Self::IntoIter {
        self.factors.iter()
    }
}
