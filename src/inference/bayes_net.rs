//! Bayes nets: ordered sequences of conditionals

use std::collections::{BTreeMap, HashMap};

use nalgebra::{DMatrix, DVector};

use super::errors::{InferenceError, Result};
use crate::conditionals::{Conditional, GaussianConditional};
use crate::types::{Key, VectorValues};

/// Conditionals in elimination order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BayesNet {
    conditionals: Vec<Conditional>,
}

impl BayesNet {
    /// Create an empty Bayes net
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a conditional
    pub fn push(&mut self, conditional: impl Into<Conditional>) {
        self.conditionals.push(conditional.into());
    }

    /// Conditionals in elimination order
    pub fn conditionals(&self) -> &[Conditional] {
        &self.conditionals
    }

    /// Iterate over conditionals
    pub fn iter(&self) -> std::slice::Iter<'_, Conditional> {
        self.conditionals.iter()
    }

    /// Number of conditionals
    pub fn len(&self) -> usize {
        self.conditionals.len()
    }

    /// Whether the net is empty
    pub fn is_empty(&self) -> bool {
        self.conditionals.is_empty()
    }

    /// Consume the net into its conditionals
    pub fn into_conditionals(self) -> Vec<Conditional> {
        self.conditionals
    }

    /// The purely Gaussian part, if every conditional is Gaussian
    pub fn gaussian(&self) -> Option<GaussianBayesNet> {
        self.conditionals
            .iter()
            .map(|c| c.as_gaussian().cloned())
            .collect::<Option<Vec<_>>>()
            .map(GaussianBayesNet::from_conditionals)
    }

    /// Same conditionals in the same order within `tol`
    pub fn equals(&self, other: &BayesNet, tol: f64) -> bool {
        self.conditionals.len() == other.conditionals.len()
            && self
                .conditionals
                .iter()
                .zip(&other.conditionals)
                .all(|(a, b)| a.equals(b, tol))
    }
}

impl FromIterator<Conditional> for BayesNet {
    fn from_iter<I: IntoIterator<Item = Conditional>>(iter: I) -> Self {
        Self {
            conditionals: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for BayesNet {
    type Item = Conditional;
    type IntoIter = std::vec::IntoIter<Conditional>;

    fn into_iter(self) -> Self::IntoIter {
        self.conditionals.into_iter()
    }
}

/// Bayes net of Gaussian conditionals
///
/// Conditionals may be stored in any order; solving follows the parent
/// dependencies rather than the storage order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GaussianBayesNet {
    conditionals: Vec<GaussianConditional>,
}

impl GaussianBayesNet {
    /// Create an empty net
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a list of conditionals
    pub fn from_conditionals(conditionals: Vec<GaussianConditional>) -> Self {
        Self { conditionals }
    }

    /// Append a conditional
    pub fn push(&mut self, conditional: GaussianConditional) {
        self.conditionals.push(conditional);
    }

    /// Conditionals in storage order
    pub fn conditionals(&self) -> &[GaussianConditional] {
        &self.conditionals
    }

    /// Number of conditionals
    pub fn len(&self) -> usize {
        self.conditionals.len()
    }

    /// Whether the net is empty
    pub fn is_empty(&self) -> bool {
        self.conditionals.is_empty()
    }

    /// Back-substitute for the mode of the joint density
    ///
    /// Conditionals are solved as soon as all their parents are known,
    /// scanning from the end so that nets in elimination order finish in a
    /// single pass.
    ///
    /// # Errors
    /// [`InferenceError::UnknownKey`] if a parent is neither solved nor the
    /// frontal of any conditional.
    pub fn optimize(&self) -> Result<VectorValues> {
        let mut solution = VectorValues::new();
        let mut pending: Vec<&GaussianConditional> = self.conditionals.iter().rev().collect();
        while !pending.is_empty() {
            let before = pending.len();
            let mut blocked = Vec::new();
            for conditional in pending {
                if conditional.parents().iter().all(|&p| solution.contains(p)) {
                    for (key, value) in conditional.solve(&solution)?.iter() {
                        solution.insert(key, value.clone());
                    }
                } else {
                    blocked.push(conditional);
                }
            }
            if blocked.len() == before {
                let missing = blocked
                    .iter()
                    .flat_map(|c| c.parents())
                    .find(|&&p| !solution.contains(p))
                    .copied()
                    .unwrap_or_default();
                return Err(InferenceError::UnknownKey(missing));
            }
            pending = blocked;
        }
        Ok(solution)
    }

    /// Variable layout `(key, offset, dim)` following the storage order of frontals
    fn layout(&self) -> (Vec<(Key, usize, usize)>, usize) {
        let mut layout = Vec::new();
        let mut offset = 0;
        for conditional in &self.conditionals {
            for (&key, &dim) in conditional.frontals().iter().zip(conditional.frontal_dims()) {
                layout.push((key, offset, dim));
                offset += dim;
            }
        }
        (layout, offset)
    }

    /// Stacked square-root system `[R S]` over all frontals, with row sigmas
    fn stacked(&self) -> Result<(Vec<(Key, usize, usize)>, DMatrix<f64>, DVector<f64>)> {
        let (layout, n) = self.layout();
        let columns: HashMap<Key, (usize, usize)> =
            layout.iter().map(|&(k, o, d)| (k, (o, d))).collect();
        let mut r = DMatrix::zeros(n, n);
        let mut sigmas = DVector::zeros(n);
        let mut row = 0;
        for conditional in &self.conditionals {
            let height = conditional.dim();
            let &(offset, _) = conditional
                .frontals()
                .first()
                .and_then(|k| columns.get(k))
                .ok_or(InferenceError::InvalidOrdering {
                    description: "conditional without frontals".to_string(),
                })?;
            r.view_mut((row, offset), (height, height))
                .copy_from(conditional.r());
            for &parent in conditional.parents() {
                let &(offset, dim) = columns
                    .get(&parent)
                    .ok_or(InferenceError::UnknownKey(parent))?;
                if let Some(block) = conditional.s(parent) {
                    r.view_mut((row, offset), (height, dim)).copy_from(block);
                }
            }
            sigmas
                .rows_mut(row, height)
                .copy_from(conditional.sigmas());
            row += height;
        }
        Ok((layout, r, sigmas))
    }

    /// Information matrix `Rᵀ Σ⁻¹ R` of the joint, in storage order of frontals
    ///
    /// # Errors
    /// [`InferenceError::NumericDegeneracy`] if a conditional has hard rows,
    /// whose information is unbounded.
    pub fn information(&self) -> Result<(Vec<(Key, usize)>, DMatrix<f64>)> {
        if let Some(c) = self.conditionals.iter().find(|c| c.is_constrained()) {
            return Err(InferenceError::NumericDegeneracy {
                key: c.frontals().first().copied().unwrap_or_default(),
                description: "hard constraint has unbounded information".to_string(),
            });
        }
        let (layout, r, sigmas) = self.stacked()?;
        let whitened = DMatrix::from_fn(r.nrows(), r.ncols(), |i, j| r[(i, j)] / sigmas[i]);
        let keys = layout.iter().map(|&(k, _, d)| (k, d)).collect();
        Ok((keys, whitened.transpose() * whitened))
    }

    /// Joint covariance of the requested keys, blocks in the order given
    ///
    /// Computed as `R⁻¹ Σ R⁻ᵀ` from the square-root form, so variables pinned
    /// by hard constraints get zero covariance.
    pub fn marginal_covariance(&self, keys: &[Key]) -> Result<DMatrix<f64>> {
        let (layout, r, sigmas) = self.stacked()?;
        let r_inv = r.try_inverse().ok_or(InferenceError::NumericDegeneracy {
            key: keys.first().copied().unwrap_or_default(),
            description: "singular square-root information".to_string(),
        })?;
        let full = &r_inv * DMatrix::from_diagonal(&sigmas.map(|s| s * s)) * r_inv.transpose();

        let columns: BTreeMap<Key, (usize, usize)> =
            layout.iter().map(|&(k, o, d)| (k, (o, d))).collect();
        let picked = keys
            .iter()
            .map(|k| columns.get(k).copied().ok_or(InferenceError::UnknownKey(*k)))
            .collect::<Result<Vec<_>>>()?;
        let n: usize = picked.iter().map(|(_, d)| d).sum();
        let mut out = DMatrix::zeros(n, n);
        let mut ro = 0;
        for &(oi, di) in &picked {
            let mut co = 0;
            for &(oj, dj) in &picked {
                out.view_mut((ro, co), (di, dj))
                    .copy_from(&full.view((oi, oj), (di, dj)));
                co += dj;
            }
            ro += di;
        }
        Ok(out)
    }

    /// Same conditionals in the same order within `tol`
    pub fn equals(&self, other: &GaussianBayesNet, tol: f64) -> bool {
        self.conditionals.len() == other.conditionals.len()
            && self
                .conditionals
                .iter()
                .zip(&other.conditionals)
                .all(|(a, b)| a.equals(b, tol))
    }
}

impl FromIterator<GaussianConditional> for GaussianBayesNet {
    fn from_iter<I: IntoIterator<Item = GaussianConditional>>(iter: I) -> Self {
        Self::from_conditionals(iter.into_iter().collect())
    }
}
