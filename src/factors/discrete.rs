//! Tabulated discrete factors
//!
//! A [`DiscreteFactor`] stores one non-negative potential per joint state of
//! its keys, in row-major order with the first key most significant. The
//! elimination code only uses it through [`DiscreteFactor::multiply`],
//! [`DiscreteFactor::marginalize`] and [`DiscreteFactor::divide`].

use super::decision_tree::enumerate_assignments;
use crate::inference::config::EliminationMode;
use crate::inference::errors::{InferenceError, Result};
use crate::types::{DiscreteKey, DiscreteValues, Key};

/// Potential table over discrete variables
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteFactor {
    keys: Vec<DiscreteKey>,
    values: Vec<f64>,
}

impl DiscreteFactor {
    /// Create a factor from keys and row-major values
    pub fn new(keys: Vec<DiscreteKey>, values: Vec<f64>) -> Result<Self> {
        for (i, k) in keys.iter().enumerate() {
            if keys[..i].iter().any(|o| o.key == k.key) {
                return Err(InferenceError::InvalidOrdering {
                    description: format!("discrete key {} repeated in factor", k.key),
                });
            }
        }
        let expected: usize = keys.iter().map(|k| k.cardinality).product();
        if values.len() != expected {
            return Err(InferenceError::DimensionMismatch {
                key: keys.first().map_or(0, |k| k.key),
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { keys, values })
    }

    /// Parse whitespace-separated values, e.g. `"2 5 3 6 4 7"`
    pub fn from_table(keys: Vec<DiscreteKey>, table: &str) -> Result<Self> {
        let values = table
            .split_whitespace()
            .map(|t| {
                t.parse::<f64>().map_err(|_| InferenceError::InvalidOrdering {
                    description: format!("invalid table entry '{}'", t),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(keys, values)
    }

    /// Factor with no keys holding a single constant
    pub fn constant(value: f64) -> Self {
        Self {
            keys: Vec::new(),
            values: vec![value],
        }
    }

    /// Keys in table order
    pub fn keys(&self) -> &[DiscreteKey] {
        &self.keys
    }

    /// Row-major values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Whether the factor involves a key
    pub fn involves(&self, key: Key) -> bool {
        self.keys.iter().any(|k| k.key == key)
    }

    /// Number of joint states
    pub fn size(&self) -> usize {
        self.values.len()
    }

    fn index_of(&self, assignment: &DiscreteValues) -> Result<usize> {
        let mut index = 0;
        for key in &self.keys {
            let state = *assignment
                .get(&key.key)
                .ok_or(InferenceError::UnknownKey(key.key))?;
            if state >= key.cardinality {
                return Err(InferenceError::DimensionMismatch {
                    key: key.key,
                    expected: key.cardinality,
                    actual: state,
                });
            }
            index = index * key.cardinality + state;
        }
        Ok(index)
    }

    /// Potential at an assignment (extra keys are ignored)
    pub fn evaluate(&self, assignment: &DiscreteValues) -> Result<f64> {
        Ok(self.values[self.index_of(assignment)?])
    }

    /// Pointwise product over the union of keys
    ///
    /// Result keys are this factor's keys followed by the other factor's new keys.
    pub fn multiply(&self, other: &DiscreteFactor) -> Result<DiscreteFactor> {
        let mut keys = self.keys.clone();
        for k in &other.keys {
            match keys.iter().find(|o| o.key == k.key) {
                Some(o) if o.cardinality != k.cardinality => {
                    return Err(InferenceError::DimensionMismatch {
                        key: k.key,
                        expected: o.cardinality,
                        actual: k.cardinality,
                    })
                }
                Some(_) => {}
                None => keys.push(*k),
            }
        }
        let values = enumerate_assignments(&keys)
            .iter()
            .map(|a| Ok(self.evaluate(a)? * other.evaluate(a)?))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keys, values })
    }

    /// Same potentials with keys in a new order
    pub fn permute(&self, order: &[DiscreteKey]) -> Result<DiscreteFactor> {
        if order.len() != self.keys.len() || order.iter().any(|k| !self.keys.contains(k)) {
            return Err(InferenceError::InvalidOrdering {
                description: "permutation must list every key of the factor once".to_string(),
            });
        }
        let values = enumerate_assignments(order)
            .iter()
            .map(|a| self.evaluate(a))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            keys: order.to_vec(),
            values,
        })
    }

    /// Sum or maximize `remove` out of the table, keeping the other keys in order
    pub fn marginalize(&self, remove: &[Key], mode: EliminationMode) -> DiscreteFactor {
        let kept: Vec<DiscreteKey> = self
            .keys
            .iter()
            .filter(|k| !remove.contains(&k.key))
            .copied()
            .collect();
        let kept_size: usize = kept.iter().map(|k| k.cardinality).product();
        let mut values = vec![0.0; kept_size];

        let strides = strides(&self.keys);
        for (index, &v) in self.values.iter().enumerate() {
            let mut out = 0;
            for (key, stride) in self.keys.iter().zip(&strides) {
                if !remove.contains(&key.key) {
                    out = out * key.cardinality + (index / stride) % key.cardinality;
                }
            }
            match mode {
                EliminationMode::Sum => values[out] += v,
                EliminationMode::Max => values[out] = values[out].max(v),
            }
        }
        DiscreteFactor { keys: kept, values }
    }

    /// Sum `remove` out of the table
    pub fn sum(&self, remove: &[Key]) -> DiscreteFactor {
        self.marginalize(remove, EliminationMode::Sum)
    }

    /// Maximize `remove` out of the table
    pub fn max(&self, remove: &[Key]) -> DiscreteFactor {
        self.marginalize(remove, EliminationMode::Max)
    }

    /// Pointwise quotient by a factor over a subset of keys, with `x / 0 = 0`
    pub fn divide(&self, denominator: &DiscreteFactor) -> Result<DiscreteFactor> {
        let values = enumerate_assignments(&self.keys)
            .iter()
            .zip(&self.values)
            .map(|(a, &v)| {
                let d = denominator.evaluate(a)?;
                Ok(if d == 0.0 { 0.0 } else { v / d })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(DiscreteFactor {
            keys: self.keys.clone(),
            values,
        })
    }

    /// Assignment with the largest potential, first in row-major order on ties
    pub fn argmax(&self) -> DiscreteValues {
        let mut best = 0;
        for (i, &v) in self.values.iter().enumerate() {
            if v > self.values[best] {
                best = i;
            }
        }
        let mut assignment = DiscreteValues::new();
        let strides = strides(&self.keys);
        for (key, stride) in self.keys.iter().zip(&strides) {
            assignment.insert(key.key, (best / stride) % key.cardinality);
        }
        assignment
    }

    /// Same keys and values within `tol`
    pub fn equals(&self, other: &DiscreteFactor, tol: f64) -> bool {
        self.keys == other.keys
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| (a - b).abs() <= tol)
    }
}

fn strides(keys: &[DiscreteKey]) -> Vec<usize> {
    let mut strides = vec![1; keys.len()];
    for i in (0..keys.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * keys[i + 1].cardinality;
    }
    strides
}
