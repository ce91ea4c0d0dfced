//! Gaussian conditionals
//!
//! `p(x_F | x_S)` stored in square-root form: `R x_F + Σ_j S_j x_j = d` with a
//! per-row sigma. Elimination produces `R` upper triangular with a unit
//! diagonal, which makes the representation unique for a given distribution
//! and frontal ordering. A zero sigma marks a row pinned by a hard constraint.

use nalgebra::{DMatrix, DVector};

use crate::common::linalg::{matrices_equal, solve_upper, vectors_equal};
use crate::factors::{GaussianFactor, NoiseModel};
use crate::inference::errors::{InferenceError, Result};
use crate::types::{Key, VectorValues};

/// Gaussian density over frontal variables given parent variables
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianConditional {
    frontals: Vec<Key>,
    frontal_dims: Vec<usize>,
    parents: Vec<Key>,
    r: DMatrix<f64>,
    s: Vec<DMatrix<f64>>,
    d: DVector<f64>,
    sigmas: DVector<f64>,
}

impl GaussianConditional {
    /// Create a conditional
    ///
    /// # Arguments
    /// * `frontals` - Frontal keys with their dimensions, in `R` column order
    /// * `r` - Upper-triangular block over the frontal variables
    /// * `parents` - Parent keys with their `S` blocks
    /// * `d` - Right-hand side
    /// * `sigmas` - Per-row standard deviations (0 for hard rows)
    pub fn new(
        frontals: Vec<(Key, usize)>,
        r: DMatrix<f64>,
        parents: Vec<(Key, DMatrix<f64>)>,
        d: DVector<f64>,
        sigmas: DVector<f64>,
    ) -> Result<Self> {
        let first = frontals.first().map_or(0, |(k, _)| *k);
        let n: usize = frontals.iter().map(|(_, dim)| dim).sum();
        for actual in [r.nrows(), r.ncols(), d.len(), sigmas.len()] {
            if actual != n {
                return Err(InferenceError::DimensionMismatch {
                    key: first,
                    expected: n,
                    actual,
                });
            }
        }
        for (key, block) in &parents {
            if block.nrows() != n {
                return Err(InferenceError::DimensionMismatch {
                    key: *key,
                    expected: n,
                    actual: block.nrows(),
                });
            }
        }
        let (frontals, frontal_dims): (Vec<Key>, Vec<usize>) = frontals.into_iter().unzip();
        let (parents, s): (Vec<Key>, Vec<DMatrix<f64>>) = parents.into_iter().unzip();
        Ok(Self {
            frontals,
            frontal_dims,
            parents,
            r,
            s,
            d,
            sigmas,
        })
    }

    /// Parentless conditional `x ~ N(mean, σ² I)`
    pub fn from_mean(key: Key, mean: DVector<f64>, sigma: f64) -> Self {
        let dim = mean.len();
        Self {
            frontals: vec![key],
            frontal_dims: vec![dim],
            parents: Vec::new(),
            r: DMatrix::identity(dim, dim),
            s: Vec::new(),
            d: mean,
            sigmas: DVector::from_element(dim, sigma),
        }
    }

    /// Frontal keys
    pub fn frontals(&self) -> &[Key] {
        &self.frontals
    }

    /// Dimension of each frontal key
    pub fn frontal_dims(&self) -> &[usize] {
        &self.frontal_dims
    }

    /// Parent keys
    pub fn parents(&self) -> &[Key] {
        &self.parents
    }

    /// Upper-triangular frontal block
    pub fn r(&self) -> &DMatrix<f64> {
        &self.r
    }

    /// Block of a parent key
    pub fn s(&self, parent: Key) -> Option<&DMatrix<f64>> {
        self.parents
            .iter()
            .position(|&k| k == parent)
            .map(|pos| &self.s[pos])
    }

    /// Right-hand side
    pub fn d(&self) -> &DVector<f64> {
        &self.d
    }

    /// Row sigmas
    pub fn sigmas(&self) -> &DVector<f64> {
        &self.sigmas
    }

    /// Total frontal dimension
    #[inline]
    pub fn dim(&self) -> usize {
        self.d.len()
    }

    /// Whether any row comes from a hard constraint
    pub fn is_constrained(&self) -> bool {
        self.sigmas.iter().any(|&s| s == 0.0)
    }

    /// `log |det R̃|` of the whitened frontal block, over soft rows only
    pub fn log_determinant(&self) -> f64 {
        (0..self.dim())
            .filter(|&i| self.sigmas[i] > 0.0)
            .map(|i| (self.r[(i, i)] / self.sigmas[i]).abs().ln())
            .sum()
    }

    /// Solve for the frontal variables given parent values
    pub fn solve(&self, parents: &VectorValues) -> Result<VectorValues> {
        let mut rhs = self.d.clone();
        for (key, block) in self.parents.iter().zip(&self.s) {
            let x = parents.get(*key).ok_or(InferenceError::UnknownKey(*key))?;
            if x.len() != block.ncols() {
                return Err(InferenceError::DimensionMismatch {
                    key: *key,
                    expected: block.ncols(),
                    actual: x.len(),
                });
            }
            rhs -= block * x;
        }
        let x = solve_upper(&self.r, &rhs).ok_or_else(|| InferenceError::NumericDegeneracy {
            key: self.frontals.first().copied().unwrap_or_default(),
            description: "singular R in back-substitution".to_string(),
        })?;

        let mut out = VectorValues::new();
        let mut offset = 0;
        for (key, dim) in self.frontals.iter().zip(&self.frontal_dims) {
            out.insert(*key, x.rows(offset, *dim).into_owned());
            offset += dim;
        }
        Ok(out)
    }

    /// The conditional as a Jacobian factor `[R S] [x_F; x_S] = d`
    pub fn to_factor(&self) -> GaussianFactor {
        let mut keys = Vec::with_capacity(self.frontals.len() + self.parents.len());
        let mut blocks = Vec::with_capacity(keys.capacity());
        let mut offset = 0;
        for (key, dim) in self.frontals.iter().zip(&self.frontal_dims) {
            keys.push(*key);
            blocks.push(self.r.columns(offset, *dim).into_owned());
            offset += dim;
        }
        keys.extend_from_slice(&self.parents);
        blocks.extend(self.s.iter().cloned());
        GaussianFactor::from_parts(
            keys,
            blocks,
            self.d.clone(),
            NoiseModel::from_sigmas(self.sigmas.clone()),
        )
    }

    /// Same keys and numbers within `tol`
    pub fn equals(&self, other: &GaussianConditional, tol: f64) -> bool {
        self.frontals == other.frontals
            && self.frontal_dims == other.frontal_dims
            && self.parents == other.parents
            && matrices_equal(&self.r, &other.r, tol)
            && self
                .s
                .iter()
                .zip(&other.s)
                .all(|(a, b)| matrices_equal(a, b, tol))
            && vectors_equal(&self.d, &other.d, tol)
            && vectors_equal(&self.sigmas, &other.sigmas, tol)
    }
}
