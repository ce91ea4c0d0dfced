//! Assignments and point estimates

use std::collections::BTreeMap;

use nalgebra::DVector;

use super::key::Key;
use crate::common::linalg::vectors_equal;

/// Assignment of a state index to each discrete variable
pub type DiscreteValues = BTreeMap<Key, usize>;

/// Continuous point estimate, one vector per variable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorValues {
    values: BTreeMap<Key, DVector<f64>>,
}

impl VectorValues {
    /// Create an empty set of values
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value of a variable
    pub fn insert(&mut self, key: Key, value: DVector<f64>) {
        self.values.insert(key, value);
    }

    /// Value of a variable, if present
    pub fn get(&self, key: Key) -> Option<&DVector<f64>> {
        self.values.get(&key)
    }

    /// Whether a variable has a value
    pub fn contains(&self, key: Key) -> bool {
        self.values.contains_key(&key)
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variable has a value
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (Key, &DVector<f64>)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Same keys and every value within `tol`
    pub fn equals(&self, other: &VectorValues, tol: f64) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .all(|(k, v)| other.values.get(k).map_or(false, |o| vectors_equal(v, o, tol)))
    }
}

impl FromIterator<(Key, DVector<f64>)> for VectorValues {
    fn from_iter<I: IntoIterator<Item = (Key, DVector<f64>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
