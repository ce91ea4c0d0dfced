//! Equality factor on a single nonlinear variable

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::Manifold;
use crate::common::constants::DEFAULT_EQUALS_TOLERANCE;
use crate::factors::{GaussianFactor, NoiseModel};
use crate::inference::{InferenceError, Result};
use crate::types::Key;

/// How strictly a [`NonlinearEquality`] holds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum EqualityMode {
    /// Hard constraint; only the feasible value may be linearized
    #[default]
    Exact,
    /// Soft constraint with error `gain * |local|²`
    AllowError {
        /// Weight on the squared deviation
        gain: f64,
    },
}

/// Factor forcing a variable to equal a fixed value
///
/// In [`EqualityMode::Exact`] the factor linearizes to a constrained
/// Gaussian factor `I δ = 0` and refuses any other linearization point. In
/// [`EqualityMode::AllowError`] it linearizes to `I δ = local(x, feasible)`
/// with sigma `1/√gain`.
#[derive(Debug, Clone)]
pub struct NonlinearEquality<T: Manifold> {
    key: Key,
    feasible: T,
    mode: EqualityMode,
    tolerance: f64,
}

impl<T: Manifold> NonlinearEquality<T> {
    /// Hard equality `x = feasible`
    pub fn new(key: Key, feasible: T) -> Self {
        Self {
            key,
            feasible,
            mode: EqualityMode::Exact,
            tolerance: DEFAULT_EQUALS_TOLERANCE,
        }
    }

    /// Soft equality with the given gain
    pub fn allow_error(key: Key, feasible: T, gain: f64) -> Self {
        Self {
            mode: EqualityMode::AllowError { gain },
            ..Self::new(key, feasible)
        }
    }

    /// Tolerance used to decide whether a value is feasible
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Constrained variable
    pub fn key(&self) -> Key {
        self.key
    }

    /// Value the variable is held at
    pub fn feasible(&self) -> &T {
        &self.feasible
    }

    /// Strictness
    pub fn mode(&self) -> EqualityMode {
        self.mode
    }

    /// Whether `value` satisfies the constraint within tolerance
    pub fn is_feasible(&self, value: &T) -> bool {
        self.feasible.equals(value, self.tolerance)
    }

    /// Tangent-space error from `value` to the feasible value
    pub fn unwhitened_error(&self, value: &T) -> Result<DVector<f64>> {
        self.check_dim(value)?;
        Ok(value.local_coordinates(&self.feasible))
    }

    /// Scalar error at `value`
    ///
    /// Exact mode gives 0 at a feasible value and infinity elsewhere.
    pub fn error(&self, value: &T) -> Result<f64> {
        let e = self.unwhitened_error(value)?;
        Ok(match self.mode {
            EqualityMode::AllowError { gain } => gain * e.norm_squared(),
            EqualityMode::Exact if self.is_feasible(value) => 0.0,
            EqualityMode::Exact => f64::INFINITY,
        })
    }

    /// Linear factor on the tangent space at `value`
    ///
    /// # Errors
    /// - [`InferenceError::InfeasibleLinearization`] in exact mode when
    ///   `value` is not the feasible value
    /// - [`InferenceError::DimensionMismatch`] if `value` has the wrong dimension
    pub fn linearize(&self, value: &T) -> Result<GaussianFactor> {
        let b = self.unwhitened_error(value)?;
        let dim = b.len();
        let noise = match self.mode {
            EqualityMode::Exact => {
                if !self.is_feasible(value) {
                    return Err(InferenceError::InfeasibleLinearization { key: self.key });
                }
                return GaussianFactor::unary(
                    self.key,
                    DMatrix::identity(dim, dim),
                    DVector::zeros(dim),
                    NoiseModel::constrained_all(dim),
                );
            }
            EqualityMode::AllowError { gain } => NoiseModel::isotropic(dim, 1.0 / gain.sqrt()),
        };
        GaussianFactor::unary(self.key, DMatrix::identity(dim, dim), b, noise)
    }

    fn check_dim(&self, value: &T) -> Result<()> {
        let expected = self.feasible.dim();
        if value.dim() != expected {
            return Err(InferenceError::DimensionMismatch {
                key: self.key,
                expected,
                actual: value.dim(),
            });
        }
        Ok(())
    }
}
