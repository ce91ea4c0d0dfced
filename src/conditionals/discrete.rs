//! Discrete conditionals
//!
//! `P(F | S)` stored as a table over the frontal keys followed by the parent
//! keys. In sum-product mode each parent column sums to one; in max-product
//! mode each column is scaled so its largest entry is one.

use crate::factors::discrete::DiscreteFactor;
use crate::factors::enumerate_assignments;
use crate::inference::config::EliminationMode;
use crate::inference::errors::{InferenceError, Result};
use crate::types::{DiscreteKey, DiscreteValues, Key};

/// Conditional table over discrete frontal variables
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteConditional {
    nr_frontals: usize,
    table: DiscreteFactor,
}

impl DiscreteConditional {
    /// Wrap a table whose first `nr_frontals` keys are frontal
    ///
    /// The table is used as-is; it is not renormalized.
    pub fn new(nr_frontals: usize, table: DiscreteFactor) -> Result<Self> {
        if nr_frontals == 0 || nr_frontals > table.keys().len() {
            return Err(InferenceError::InvalidOrdering {
                description: format!(
                    "conditional needs 1..={} frontal keys, got {}",
                    table.keys().len(),
                    nr_frontals
                ),
            });
        }
        Ok(Self { nr_frontals, table })
    }

    /// Factor a joint table into `P(F | S) · φ(S)`
    ///
    /// Returns the conditional (keys: `frontals` then the remaining keys in
    /// their original order) and the residual `φ(S)`.
    pub fn from_joint(
        joint: &DiscreteFactor,
        frontals: &[Key],
        mode: EliminationMode,
    ) -> Result<(Self, DiscreteFactor)> {
        let mut order: Vec<DiscreteKey> = Vec::with_capacity(joint.keys().len());
        for &key in frontals {
            let dk = joint
                .keys()
                .iter()
                .find(|k| k.key == key)
                .ok_or(InferenceError::UnknownKey(key))?;
            order.push(*dk);
        }
        order.extend(joint.keys().iter().filter(|k| !frontals.contains(&k.key)));

        let joint = joint.permute(&order)?;
        let residual = joint.marginalize(frontals, mode);
        let table = joint.divide(&residual)?;
        Ok((
            Self {
                nr_frontals: frontals.len(),
                table,
            },
            residual,
        ))
    }

    /// Frontal keys
    pub fn frontals(&self) -> &[DiscreteKey] {
        &self.table.keys()[..self.nr_frontals]
    }

    /// Parent keys
    pub fn parents(&self) -> &[DiscreteKey] {
        &self.table.keys()[self.nr_frontals..]
    }

    /// Underlying table, frontal keys first
    pub fn table(&self) -> &DiscreteFactor {
        &self.table
    }

    /// Probability of an assignment of frontals and parents
    pub fn evaluate(&self, assignment: &DiscreteValues) -> Result<f64> {
        self.table.evaluate(assignment)
    }

    /// Most probable frontal assignment given the parents
    pub fn argmax(&self, parents: &DiscreteValues) -> Result<DiscreteValues> {
        let mut best: Option<(DiscreteValues, f64)> = None;
        for frontal in enumerate_assignments(self.frontals()) {
            let mut full = parents.clone();
            full.extend(frontal.iter().map(|(k, v)| (*k, *v)));
            let p = self.table.evaluate(&full)?;
            if best.as_ref().map_or(true, |(_, b)| p > *b) {
                best = Some((frontal, p));
            }
        }
        Ok(best.map(|(a, _)| a).unwrap_or_default())
    }

    /// The conditional as a plain factor
    pub fn to_factor(&self) -> DiscreteFactor {
        self.table.clone()
    }

    /// Same frontals and table within `tol`
    pub fn equals(&self, other: &DiscreteConditional, tol: f64) -> bool {
        self.nr_frontals == other.nr_frontals && self.table.equals(&other.table, tol)
    }
}
