//! Elimination orderings
//!
//! An [`Ordering`] is a sequence of groups. A group of one key eliminates a
//! single variable; a larger group eliminates a cluster jointly and yields a
//! single conditional with several frontal keys. Orderings affect fill-in and
//! cost, never the represented distribution.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use smallvec::{smallvec, SmallVec};

use super::config::OrderingPolicy;
use super::errors::{InferenceError, Result};
use crate::factors::FactorGraph;
use crate::types::{Key, KeyDisplay};

/// Keys eliminated together in one step
pub type Group = SmallVec<[Key; 2]>;

/// Sequence of elimination groups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ordering {
    groups: Vec<Group>,
}

impl Ordering {
    /// Ordering from explicit groups
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    /// One group per key, in the given order
    pub fn from_keys(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            groups: keys.into_iter().map(|k| smallvec![k]).collect(),
        }
    }

    /// Ordering chosen by a policy
    pub fn from_policy(graph: &FactorGraph, policy: OrderingPolicy) -> Result<Self> {
        match policy {
            OrderingPolicy::Natural => Self::natural(graph),
            OrderingPolicy::MinDegree => Self::min_degree(graph),
        }
    }

    /// Continuous keys ascending, then discrete keys ascending
    pub fn natural(graph: &FactorGraph) -> Result<Self> {
        let discrete = graph.discrete_cardinalities()?;
        let (continuous, discrete): (Vec<Key>, Vec<Key>) =
            graph.keys().into_iter().partition(|k| !discrete.contains_key(k));
        Ok(Self::from_keys(continuous.into_iter().chain(discrete)))
    }

    /// Greedy minimum-degree ordering with discrete keys last
    ///
    /// At each step the remaining key with the fewest neighbours is
    /// eliminated and its neighbours are connected. Ties go to the smaller
    /// key, so the result is deterministic.
    pub fn min_degree(graph: &FactorGraph) -> Result<Self> {
        let discrete = graph.discrete_cardinalities()?;
        let mut adjacency: BTreeMap<Key, BTreeSet<Key>> = BTreeMap::new();
        for factor in graph {
            let keys = factor.keys();
            for &a in &keys {
                let neighbours = adjacency.entry(a).or_default();
                neighbours.extend(keys.iter().copied().filter(|&b| b != a));
            }
        }

        let mut keys = Vec::with_capacity(adjacency.len());
        for pass_discrete in [false, true] {
            loop {
                let next = adjacency
                    .iter()
                    .filter(|(k, _)| discrete.contains_key(*k) == pass_discrete)
                    .min_by_key(|(k, n)| (n.len(), **k))
                    .map(|(k, _)| *k);
                let Some(key) = next else { break };
                let neighbours = adjacency.remove(&key).unwrap_or_default();
                for &n in &neighbours {
                    if let Some(set) = adjacency.get_mut(&n) {
                        set.remove(&key);
                        set.extend(neighbours.iter().copied().filter(|&m| m != n));
                    }
                }
                keys.push(key);
            }
        }
        log::trace!("min-degree ordering over {} keys", keys.len());
        Ok(Self::from_keys(keys))
    }

    /// Groups in elimination order
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// All keys flattened in elimination order
    pub fn keys(&self) -> Vec<Key> {
        self.groups.iter().flatten().copied().collect()
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the ordering is empty
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Append a single key
    pub fn push(&mut self, key: Key) {
        self.groups.push(smallvec![key]);
    }

    /// Append a cluster eliminated jointly
    pub fn push_group(&mut self, group: Group) {
        self.groups.push(group);
    }

    /// Check the ordering against a graph
    ///
    /// Every key of the graph must appear exactly once, no other key may
    /// appear, groups must be non-empty and must not mix continuous and
    /// discrete keys.
    pub fn validate(&self, graph: &FactorGraph) -> Result<()> {
        let discrete = graph.discrete_cardinalities()?;
        let graph_keys = graph.keys();
        let mut seen: HashSet<Key> = HashSet::with_capacity(graph_keys.len());
        for group in &self.groups {
            let first = group.first().ok_or_else(|| InferenceError::InvalidOrdering {
                description: "empty elimination group".to_string(),
            })?;
            let first_discrete = discrete.contains_key(first);
            for &key in group {
                if !graph_keys.contains(&key) {
                    return Err(InferenceError::InvalidOrdering {
                        description: format!("key {} is not in the graph", KeyDisplay(key)),
                    });
                }
                if !seen.insert(key) {
                    return Err(InferenceError::InvalidOrdering {
                        description: format!("key {} appears twice", KeyDisplay(key)),
                    });
                }
                if discrete.contains_key(&key) != first_discrete {
                    return Err(InferenceError::InvalidOrdering {
                        description: format!(
                            "group mixes continuous and discrete keys at {}",
                            KeyDisplay(key)
                        ),
                    });
                }
            }
        }
        if let Some(missing) = graph_keys.iter().find(|k| !seen.contains(k)) {
            return Err(InferenceError::InvalidOrdering {
                description: format!("key {} is missing", KeyDisplay(*missing)),
            });
        }
        Ok(())
    }
}

impl FromIterator<Key> for Ordering {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self::from_keys(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::{DiscreteFactor, GaussianFactor, HybridGaussianFactor};
    use crate::types::DiscreteKey;
    use nalgebra::DVector;

    fn chain(n: u64) -> FactorGraph {
        let mut graph = FactorGraph::new();
        graph.push(GaussianFactor::prior(1, DVector::zeros(1), 1.0));
        for k in 1..n {
            graph.push(GaussianFactor::between(k, k + 1, DVector::zeros(1), 1.0));
        }
        graph
    }

    #[test]
    fn test_natural_puts_discrete_last() {
        let mut graph = chain(3);
        let m = DiscreteKey::new(0, 2);
        graph.push(
            HybridGaussianFactor::new(
                vec![m],
                vec![
                    GaussianFactor::prior(3, DVector::zeros(1), 1.0),
                    GaussianFactor::prior(3, DVector::zeros(1), 2.0),
                ],
            )
            .unwrap(),
        );
        assert_eq!(Ordering::natural(&graph).unwrap().keys(), vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_min_degree_chain_eliminates_leaves_first() {
        let graph = chain(4);
        let ordering = Ordering::min_degree(&graph).unwrap();
        assert_eq!(ordering.keys()[0], 1);
        ordering.validate(&graph).unwrap();
    }

    #[test]
    fn test_min_degree_discrete_last() {
        let mut graph = chain(2);
        graph.push(DiscreteFactor::from_table(vec![DiscreteKey::new(0, 2)], "1 1").unwrap());
        let keys = Ordering::min_degree(&graph).unwrap().keys();
        assert_eq!(keys.last(), Some(&0));
    }

    #[test]
    fn test_validate_rejects_missing_and_duplicate() {
        let graph = chain(3);
        assert!(Ordering::from_keys([1, 2]).validate(&graph).is_err());
        assert!(Ordering::from_keys([1, 2, 2, 3]).validate(&graph).is_err());
        assert!(Ordering::from_keys([1, 2, 3, 4]).validate(&graph).is_err());
        Ordering::new(vec![smallvec![1, 2], smallvec![3]])
            .validate(&graph)
            .unwrap();
    }

    #[test]
    fn test_validate_rejects_mixed_group() {
        let mut graph = chain(1);
        graph.push(DiscreteFactor::from_table(vec![DiscreteKey::new(0, 2)], "1 1").unwrap());
        let err = Ordering::new(vec![smallvec![1, 0]]).validate(&graph).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidOrdering { .. }));
    }
}
