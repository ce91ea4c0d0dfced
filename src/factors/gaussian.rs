//! Linear Gaussian factors in Jacobian form
//!
//! A factor `‖Σ_j A_j x_j - b‖²_Σ` stores one Jacobian block per key, a
//! right-hand side and a [`NoiseModel`]. Factors are produced by an external
//! linearization step; elimination consumes them as-is.

use nalgebra::{DMatrix, DVector};

use super::noise::NoiseModel;
use crate::common::linalg::{matrices_equal, vectors_equal};
use crate::inference::errors::{InferenceError, Result};
use crate::types::{Key, VectorValues};

/// Linear Gaussian factor `½‖A x - b‖²` whitened by its noise model
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianFactor {
    keys: Vec<Key>,
    blocks: Vec<DMatrix<f64>>,
    b: DVector<f64>,
    noise: NoiseModel,
}

impl GaussianFactor {
    /// Create a factor from `(key, Jacobian block)` terms
    ///
    /// Blocks for a repeated key are summed. Every block, `b` and the noise
    /// model must agree on the number of rows.
    pub fn new(
        terms: Vec<(Key, DMatrix<f64>)>,
        b: DVector<f64>,
        noise: NoiseModel,
    ) -> Result<Self> {
        let rows = b.len();
        if noise.dim() != rows {
            return Err(InferenceError::DimensionMismatch {
                key: terms.first().map_or(0, |(k, _)| *k),
                expected: rows,
                actual: noise.dim(),
            });
        }

        let mut keys: Vec<Key> = Vec::with_capacity(terms.len());
        let mut blocks: Vec<DMatrix<f64>> = Vec::with_capacity(terms.len());
        for (key, block) in terms {
            if block.nrows() != rows {
                return Err(InferenceError::DimensionMismatch {
                    key,
                    expected: rows,
                    actual: block.nrows(),
                });
            }
            match keys.iter().position(|&k| k == key) {
                Some(pos) => {
                    if blocks[pos].ncols() != block.ncols() {
                        return Err(InferenceError::DimensionMismatch {
                            key,
                            expected: blocks[pos].ncols(),
                            actual: block.ncols(),
                        });
                    }
                    blocks[pos] += block;
                }
                None => {
                    keys.push(key);
                    blocks.push(block);
                }
            }
        }

        Ok(Self {
            keys,
            blocks,
            b,
            noise,
        })
    }

    /// Assemble a factor whose shapes are already known to agree
    pub(crate) fn from_parts(
        keys: Vec<Key>,
        blocks: Vec<DMatrix<f64>>,
        b: DVector<f64>,
        noise: NoiseModel,
    ) -> Self {
        debug_assert_eq!(keys.len(), blocks.len());
        debug_assert!(blocks.iter().all(|blk| blk.nrows() == b.len()));
        Self {
            keys,
            blocks,
            b,
            noise,
        }
    }

    /// Unary factor `A x - b`
    pub fn unary(key: Key, a: DMatrix<f64>, b: DVector<f64>, noise: NoiseModel) -> Result<Self> {
        Self::new(vec![(key, a)], b, noise)
    }

    /// Binary factor `A1 x1 + A2 x2 - b`
    pub fn binary(
        key1: Key,
        a1: DMatrix<f64>,
        key2: Key,
        a2: DMatrix<f64>,
        b: DVector<f64>,
        noise: NoiseModel,
    ) -> Result<Self> {
        Self::new(vec![(key1, a1), (key2, a2)], b, noise)
    }

    /// Prior `x = mean` with isotropic sigma
    pub fn prior(key: Key, mean: DVector<f64>, sigma: f64) -> Self {
        let dim = mean.len();
        Self {
            keys: vec![key],
            blocks: vec![DMatrix::identity(dim, dim)],
            b: mean,
            noise: NoiseModel::isotropic(dim, sigma),
        }
    }

    /// Relative constraint `x2 - x1 = delta` with isotropic sigma
    pub fn between(key1: Key, key2: Key, delta: DVector<f64>, sigma: f64) -> Self {
        let dim = delta.len();
        Self {
            keys: vec![key1, key2],
            blocks: vec![-DMatrix::identity(dim, dim), DMatrix::identity(dim, dim)],
            b: delta,
            noise: NoiseModel::isotropic(dim, sigma),
        }
    }

    /// Keys in block order
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Jacobian blocks in key order
    pub fn blocks(&self) -> &[DMatrix<f64>] {
        &self.blocks
    }

    /// Jacobian block of a key
    pub fn block(&self, key: Key) -> Option<&DMatrix<f64>> {
        self.keys
            .iter()
            .position(|&k| k == key)
            .map(|pos| &self.blocks[pos])
    }

    /// Dimension of a key in this factor
    pub fn dim_of(&self, key: Key) -> Option<usize> {
        self.block(key).map(|b| b.ncols())
    }

    /// Right-hand side
    pub fn b(&self) -> &DVector<f64> {
        &self.b
    }

    /// Noise model
    pub fn noise(&self) -> &NoiseModel {
        &self.noise
    }

    /// Number of rows
    #[inline]
    pub fn rows(&self) -> usize {
        self.b.len()
    }

    /// Whether the factor involves a key
    pub fn involves(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    /// Unwhitened residual `A x - b`
    pub fn unwhitened_error(&self, values: &VectorValues) -> Result<DVector<f64>> {
        let mut e = -self.b.clone();
        for (key, block) in self.keys.iter().zip(&self.blocks) {
            let x = values.get(*key).ok_or(InferenceError::UnknownKey(*key))?;
            if x.len() != block.ncols() {
                return Err(InferenceError::DimensionMismatch {
                    key: *key,
                    expected: block.ncols(),
                    actual: x.len(),
                });
            }
            e += block * x;
        }
        Ok(e)
    }

    /// Error `½‖A x - b‖²_Σ`
    pub fn error(&self, values: &VectorValues) -> Result<f64> {
        let e = self.unwhitened_error(values)?;
        Ok(0.5 * self.noise.squared_mahalanobis(&e))
    }

    /// Same keys, blocks, rhs and noise within `tol`
    pub fn equals(&self, other: &GaussianFactor, tol: f64) -> bool {
        self.keys == other.keys
            && self
                .blocks
                .iter()
                .zip(&other.blocks)
                .all(|(a, b)| matrices_equal(a, b, tol))
            && vectors_equal(&self.b, &other.b, tol)
            && self.noise.equals(&other.noise, tol)
    }
}
