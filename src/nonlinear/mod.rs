//! Nonlinear values and factors that linearize into Gaussian factors
//!
//! The elimination engine only consumes linear factors. This module provides
//! the small amount of nonlinear machinery needed to produce them:
//!
//! - [`Manifold`] - values with a tangent-space chart (`local_coordinates`)
//! - [`NonlinearEquality`] - pins a variable to a fixed value, either exactly
//!   (hard constraint) or with a large finite gain

pub mod equality;

pub use equality::{EqualityMode, NonlinearEquality};

use nalgebra::DVector;

use crate::common::linalg::vectors_equal;

/// A value living on a manifold
///
/// `local_coordinates(other)` is the tangent vector at `self` pointing to
/// `other`, so `a.local_coordinates(&a)` is zero.
pub trait Manifold: Clone + std::fmt::Debug {
    /// Tangent space dimension
    fn dim(&self) -> usize;

    /// Tangent vector from `self` to `other`
    fn local_coordinates(&self, other: &Self) -> DVector<f64>;

    /// Equality within `tol`
    fn equals(&self, other: &Self, tol: f64) -> bool;
}

impl Manifold for DVector<f64> {
    fn dim(&self) -> usize {
        self.len()
    }

    fn local_coordinates(&self, other: &Self) -> DVector<f64> {
        other - self
    }

    fn equals(&self, other: &Self, tol: f64) -> bool {
        vectors_equal(self, other, tol)
    }
}

impl Manifold for f64 {
    fn dim(&self) -> usize {
        1
    }

    fn local_coordinates(&self, other: &Self) -> DVector<f64> {
        DVector::from_element(1, other - self)
    }

    fn equals(&self, other: &Self, tol: f64) -> bool {
        (self - other).abs() <= tol
    }
}

/// Planar heading in radians
///
/// Local coordinates wrap into `(-π, π]`, so headings just either side of
/// `±π` are close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angle(pub f64);

impl Angle {
    /// Wrap an angle into `(-π, π]`
    pub fn wrap(theta: f64) -> f64 {
        use std::f64::consts::PI;
        let wrapped = (theta + PI).rem_euclid(2.0 * PI) - PI;
        if wrapped <= -PI {
            wrapped + 2.0 * PI
        } else {
            wrapped
        }
    }
}

impl Manifold for Angle {
    fn dim(&self) -> usize {
        1
    }

    fn local_coordinates(&self, other: &Self) -> DVector<f64> {
        DVector::from_element(1, Angle::wrap(other.0 - self.0))
    }

    fn equals(&self, other: &Self, tol: f64) -> bool {
        Angle::wrap(other.0 - self.0).abs() <= tol
    }
}
