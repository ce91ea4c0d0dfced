//! Noise models for Gaussian factors
//!
//! A noise model assigns a standard deviation to every row of a factor.
//! Elimination only needs the per-row weights `1/σ²`; a zero sigma in a
//! [`NoiseModel::Constrained`] model marks a hard equality row whose weight
//! is infinite.

use nalgebra::DVector;

use crate::common::linalg::vectors_equal;

/// Per-row uncertainty of a Gaussian factor
#[derive(Debug, Clone, PartialEq)]
pub enum NoiseModel {
    /// Unit sigma on every row (already whitened)
    Unit {
        /// Number of rows
        dim: usize,
    },
    /// Same sigma on every row
    Isotropic {
        /// Number of rows
        dim: usize,
        /// Standard deviation
        sigma: f64,
    },
    /// One sigma per row
    Diagonal {
        /// Standard deviations
        sigmas: DVector<f64>,
    },
    /// One sigma per row where zero means a hard constraint
    Constrained {
        /// Standard deviations (0 for hard rows)
        sigmas: DVector<f64>,
    },
}

impl NoiseModel {
    /// Unit noise on `dim` rows
    pub fn unit(dim: usize) -> Self {
        NoiseModel::Unit { dim }
    }

    /// Isotropic noise with the given sigma
    pub fn isotropic(dim: usize, sigma: f64) -> Self {
        NoiseModel::Isotropic { dim, sigma }
    }

    /// Diagonal noise from per-row sigmas
    pub fn diagonal(sigmas: DVector<f64>) -> Self {
        NoiseModel::Diagonal { sigmas }
    }

    /// Hard constraint on all `dim` rows
    pub fn constrained_all(dim: usize) -> Self {
        NoiseModel::Constrained {
            sigmas: DVector::zeros(dim),
        }
    }

    /// Mixed model: zero sigmas are hard rows, the rest are soft
    pub fn constrained(sigmas: DVector<f64>) -> Self {
        NoiseModel::Constrained { sigmas }
    }

    /// Build the most specific model for the given sigmas
    ///
    /// All ones gives [`NoiseModel::Unit`]; any zero gives
    /// [`NoiseModel::Constrained`]; otherwise [`NoiseModel::Diagonal`].
    pub fn from_sigmas(sigmas: DVector<f64>) -> Self {
        if sigmas.iter().any(|&s| s == 0.0) {
            NoiseModel::Constrained { sigmas }
        } else if sigmas.iter().all(|&s| s == 1.0) {
            NoiseModel::Unit { dim: sigmas.len() }
        } else {
            NoiseModel::Diagonal { sigmas }
        }
    }

    /// Number of rows
    pub fn dim(&self) -> usize {
        match self {
            NoiseModel::Unit { dim } | NoiseModel::Isotropic { dim, .. } => *dim,
            NoiseModel::Diagonal { sigmas } | NoiseModel::Constrained { sigmas } => sigmas.len(),
        }
    }

    /// Standard deviation of a row
    pub fn sigma(&self, row: usize) -> f64 {
        match self {
            NoiseModel::Unit { .. } => 1.0,
            NoiseModel::Isotropic { sigma, .. } => *sigma,
            NoiseModel::Diagonal { sigmas } | NoiseModel::Constrained { sigmas } => sigmas[row],
        }
    }

    /// All row sigmas
    pub fn sigmas(&self) -> DVector<f64> {
        DVector::from_fn(self.dim(), |i, _| self.sigma(i))
    }

    /// Row weights `1/σ²`, infinite for hard rows
    pub fn weights(&self) -> Vec<f64> {
        (0..self.dim())
            .map(|i| {
                let s = self.sigma(i);
                if s == 0.0 {
                    f64::INFINITY
                } else {
                    1.0 / (s * s)
                }
            })
            .collect()
    }

    /// Whether any row is a hard constraint
    pub fn is_constrained(&self) -> bool {
        match self {
            NoiseModel::Constrained { sigmas } => sigmas.iter().any(|&s| s == 0.0),
            _ => false,
        }
    }

    /// Whitened squared norm `Σ (vᵢ/σᵢ)²` of an unwhitened residual
    ///
    /// Hard rows contribute nothing when satisfied and make the result
    /// infinite otherwise.
    pub fn squared_mahalanobis(&self, v: &DVector<f64>) -> f64 {
        v.iter()
            .enumerate()
            .map(|(i, &e)| {
                let s = self.sigma(i);
                if s == 0.0 {
                    if e == 0.0 {
                        0.0
                    } else {
                        f64::INFINITY
                    }
                } else {
                    (e / s) * (e / s)
                }
            })
            .sum()
    }

    /// Same row sigmas within `tol`
    pub fn equals(&self, other: &NoiseModel, tol: f64) -> bool {
        self.is_constrained() == other.is_constrained()
            && vectors_equal(&self.sigmas(), &other.sigmas(), tol)
    }
}
