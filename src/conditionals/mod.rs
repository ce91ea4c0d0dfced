//! Conditional densities produced by elimination
//!
//! - [`GaussianConditional`] - `p(x_F | x_S)` in square-root form
//! - [`DiscreteConditional`] - `P(F | S)` as a normalized table
//! - [`GaussianMixture`] - Gaussian conditional selected by discrete parents

pub mod discrete;
pub mod gaussian;
pub mod mixture;

pub use discrete::DiscreteConditional;
pub use gaussian::GaussianConditional;
pub use mixture::GaussianMixture;

use crate::factors::{Factor, Kind};
use crate::inference::errors::Result;
use crate::types::Key;

/// A conditional of any kind
#[derive(Debug, Clone, PartialEq)]
pub enum Conditional {
    /// Linear Gaussian conditional
    Gaussian(GaussianConditional),
    /// Discrete conditional table
    Discrete(DiscreteConditional),
    /// Gaussian mixture over discrete parents
    Hybrid(GaussianMixture),
}

impl Conditional {
    /// Kind discriminant
    pub fn kind(&self) -> Kind {
        match self {
            Conditional::Gaussian(_) => Kind::Gaussian,
            Conditional::Discrete(_) => Kind::Discrete,
            Conditional::Hybrid(_) => Kind::Hybrid,
        }
    }

    /// Frontal keys in elimination order
    pub fn frontals(&self) -> Vec<Key> {
        match self {
            Conditional::Gaussian(c) => c.frontals().to_vec(),
            Conditional::Discrete(c) => c.frontals().iter().map(|k| k.key).collect(),
            Conditional::Hybrid(c) => c.frontals().to_vec(),
        }
    }

    /// Parent (separator) keys, continuous first
    pub fn parents(&self) -> Vec<Key> {
        match self {
            Conditional::Gaussian(c) => c.parents().to_vec(),
            Conditional::Discrete(c) => c.parents().iter().map(|k| k.key).collect(),
            Conditional::Hybrid(c) => c
                .continuous_parents()
                .iter()
                .copied()
                .chain(c.discrete_parents().iter().map(|k| k.key))
                .collect(),
        }
    }

    /// Whether `key` is a frontal of this conditional
    pub fn is_frontal(&self, key: Key) -> bool {
        self.frontals().contains(&key)
    }

    /// The conditional as a factor of the same kind
    pub fn to_factor(&self) -> Result<Factor> {
        Ok(match self {
            Conditional::Gaussian(c) => Factor::Gaussian(c.to_factor()),
            Conditional::Discrete(c) => Factor::Discrete(c.to_factor()),
            Conditional::Hybrid(c) => Factor::Hybrid(c.to_factor()?),
        })
    }

    /// Gaussian conditional, if this is one
    pub fn as_gaussian(&self) -> Option<&GaussianConditional> {
        match self {
            Conditional::Gaussian(c) => Some(c),
            _ => None,
        }
    }

    /// Discrete conditional, if this is one
    pub fn as_discrete(&self) -> Option<&DiscreteConditional> {
        match self {
            Conditional::Discrete(c) => Some(c),
            _ => None,
        }
    }

    /// Mixture conditional, if this is one
    pub fn as_mixture(&self) -> Option<&GaussianMixture> {
        match self {
            Conditional::Hybrid(c) => Some(c),
            _ => None,
        }
    }

    /// Same kind and contents within `tol`
    pub fn equals(&self, other: &Conditional, tol: f64) -> bool {
        match (self, other) {
            (Conditional::Gaussian(a), Conditional::Gaussian(b)) => a.equals(b, tol),
            (Conditional::Discrete(a), Conditional::Discrete(b)) => a.equals(b, tol),
            (Conditional::Hybrid(a), Conditional::Hybrid(b)) => a.equals(b, tol),
            _ => false,
        }
    }
}

impl From<GaussianConditional> for Conditional {
    fn from(c: GaussianConditional) -> Self {
        Conditional::Gaussian(c)
    }
}

impl From<DiscreteConditional> for Conditional {
    fn from(c: DiscreteConditional) -> Self {
        Conditional::Discrete(c)
    }
}

impl From<GaussianMixture> for Conditional {
    fn from(c: GaussianMixture) -> Self {
        Conditional::Hybrid(c)
    }
}
