//! Decision trees keyed by discrete assignments
//!
//! A [`DecisionTree`] branches on one discrete variable per level, so a
//! lookup walks one node per key in the assignment instead of scanning the
//! stored leaves. Trees built with [`DecisionTree::from_leaves`] are regular:
//! every root-to-leaf path tests the same keys in the same order.

use crate::inference::errors::{InferenceError, Result};
use crate::types::{DiscreteKey, DiscreteValues};

/// Mapping from discrete assignment to a value
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionTree<T> {
    /// Value reached once every tested key is fixed
    Leaf(T),
    /// Branch on a discrete variable, one subtree per state
    Choice {
        /// Variable tested at this node
        key: DiscreteKey,
        /// Subtree per state, indexed by state
        branches: Vec<DecisionTree<T>>,
    },
}

impl<T> DecisionTree<T> {
    /// Single leaf, independent of any assignment
    pub fn leaf(value: T) -> Self {
        DecisionTree::Leaf(value)
    }

    /// Build from leaves listed in row-major order (first key most significant)
    pub fn from_leaves(keys: &[DiscreteKey], leaves: Vec<T>) -> Result<Self> {
        let expected: usize = keys.iter().map(|k| k.cardinality).product();
        if leaves.len() != expected {
            return Err(InferenceError::DimensionMismatch {
                key: keys.first().map_or(0, |k| k.key),
                expected,
                actual: leaves.len(),
            });
        }
        let mut iter = leaves.into_iter();
        Self::build(keys, &mut iter).ok_or(InferenceError::DimensionMismatch {
            key: keys.first().map_or(0, |k| k.key),
            expected,
            actual: 0,
        })
    }

    fn build(keys: &[DiscreteKey], leaves: &mut std::vec::IntoIter<T>) -> Option<Self> {
        match keys.split_first() {
            None => leaves.next().map(DecisionTree::Leaf),
            Some((key, rest)) => {
                let branches = (0..key.cardinality)
                    .map(|_| Self::build(rest, leaves))
                    .collect::<Option<Vec<_>>>()?;
                Some(DecisionTree::Choice { key: *key, branches })
            }
        }
    }

    /// Leaf selected by an assignment
    ///
    /// Walks one level per tested key. Keys in the assignment that the tree
    /// does not test are ignored.
    pub fn get(&self, assignment: &DiscreteValues) -> Result<&T> {
        let mut node = self;
        loop {
            match node {
                DecisionTree::Leaf(value) => return Ok(value),
                DecisionTree::Choice { key, branches } => {
                    let state = *assignment
                        .get(&key.key)
                        .ok_or(InferenceError::UnknownKey(key.key))?;
                    node = branches.get(state).ok_or(InferenceError::DimensionMismatch {
                        key: key.key,
                        expected: key.cardinality,
                        actual: state,
                    })?;
                }
            }
        }
    }

    /// Keys tested along the first path, root first
    pub fn keys(&self) -> Vec<DiscreteKey> {
        let mut keys = Vec::new();
        let mut node = self;
        while let DecisionTree::Choice { key, branches } = node {
            keys.push(*key);
            match branches.first() {
                Some(first) => node = first,
                None => break,
            }
        }
        keys
    }

    /// Leaves in row-major order
    pub fn leaves(&self) -> Vec<&T> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a T>) {
        match self {
            DecisionTree::Leaf(value) => out.push(value),
            DecisionTree::Choice { branches, .. } => {
                for branch in branches {
                    branch.collect_leaves(out);
                }
            }
        }
    }

    /// Number of leaves
    pub fn num_leaves(&self) -> usize {
        match self {
            DecisionTree::Leaf(_) => 1,
            DecisionTree::Choice { branches, .. } => branches.iter().map(|b| b.num_leaves()).sum(),
        }
    }

    /// Apply `f` to every leaf, keeping the branching structure
    pub fn map<U>(&self, f: &impl Fn(&T) -> U) -> DecisionTree<U> {
        match self {
            DecisionTree::Leaf(value) => DecisionTree::Leaf(f(value)),
            DecisionTree::Choice { key, branches } => DecisionTree::Choice {
                key: *key,
                branches: branches.iter().map(|b| b.map(f)).collect(),
            },
        }
    }

    /// Same branching and leaves equal under `leaf_equals`
    pub fn equals_with(&self, other: &DecisionTree<T>, leaf_equals: &impl Fn(&T, &T) -> bool) -> bool {
        match (self, other) {
            (DecisionTree::Leaf(a), DecisionTree::Leaf(b)) => leaf_equals(a, b),
            (
                DecisionTree::Choice { key: ka, branches: ba },
                DecisionTree::Choice { key: kb, branches: bb },
            ) => {
                ka == kb
                    && ba.len() == bb.len()
                    && ba.iter().zip(bb).all(|(a, b)| a.equals_with(b, leaf_equals))
            }
            _ => false,
        }
    }
}

/// All assignments of `keys` in row-major order (first key most significant)
pub fn enumerate_assignments(keys: &[DiscreteKey]) -> Vec<DiscreteValues> {
    let total: usize = keys.iter().map(|k| k.cardinality).product();
    let mut out = Vec::with_capacity(total);
    for mut index in 0..total {
        let mut values = DiscreteValues::new();
        for key in keys.iter().rev() {
            values.insert(key.key, index % key.cardinality);
            index /= key.cardinality;
        }
        out.push(values);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> Vec<DiscreteKey> {
        vec![DiscreteKey::new(10, 2), DiscreteKey::new(20, 3)]
    }

    #[test]
    fn test_lookup_row_major() {
        let tree = DecisionTree::from_leaves(&keys(), (0..6).collect()).unwrap();
        let mut values = DiscreteValues::new();
        values.insert(10, 1);
        values.insert(20, 2);
        assert_eq!(*tree.get(&values).unwrap(), 5);
        values.insert(10, 0);
        values.insert(20, 1);
        assert_eq!(*tree.get(&values).unwrap(), 1);
    }

    #[test]
    fn test_missing_and_out_of_range() {
        let tree = DecisionTree::from_leaves(&keys(), (0..6).collect()).unwrap();
        let mut values = DiscreteValues::new();
        values.insert(10, 0);
        assert_eq!(tree.get(&values).unwrap_err(), InferenceError::UnknownKey(20));
        values.insert(20, 7);
        assert!(matches!(
            tree.get(&values).unwrap_err(),
            InferenceError::DimensionMismatch { key: 20, .. }
        ));
    }

    #[test]
    fn test_wrong_leaf_count() {
        assert!(DecisionTree::from_leaves(&keys(), vec![1, 2, 3]).is_err());
    }

    #[test]
    fn test_keys_leaves_and_map() {
        let tree = DecisionTree::from_leaves(&keys(), (0..6).collect()).unwrap();
        assert_eq!(tree.keys(), keys());
        assert_eq!(tree.num_leaves(), 6);
        let doubled = tree.map(&|v| v * 2);
        let leaves: Vec<i32> = doubled.leaves().into_iter().copied().collect();
        assert_eq!(leaves, vec![0, 2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_enumerate_matches_leaf_order() {
        let assignments = enumerate_assignments(&keys());
        let tree = DecisionTree::from_leaves(&keys(), (0..6).collect()).unwrap();
        for (i, a) in assignments.iter().enumerate() {
            assert_eq!(*tree.get(a).unwrap(), i);
        }
        assert_eq!(enumerate_assignments(&[]).len(), 1);
    }
}
