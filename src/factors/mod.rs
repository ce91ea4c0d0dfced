//! Factors and factor graphs
//!
//! Factors come in three kinds, modelled as the closed variant [`Factor`]:
//!
//! - [`GaussianFactor`] - linear Gaussian factor in Jacobian form
//! - [`DiscreteFactor`] - tabulated potential over discrete keys
//! - [`HybridGaussianFactor`] - Gaussian factor selected by a discrete assignment

pub mod decision_tree;
pub mod discrete;
pub mod gaussian;
pub mod graph;
pub mod hybrid;
pub mod noise;

pub use decision_tree::{enumerate_assignments, DecisionTree};
pub use discrete::DiscreteFactor;
pub use gaussian::GaussianFactor;
pub use graph::FactorGraph;
pub use hybrid::HybridGaussianFactor;
pub use noise::NoiseModel;

use crate::types::{DiscreteKey, Key};

/// Kind discriminant shared by factors and conditionals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Purely continuous
    Gaussian,
    /// Purely discrete
    Discrete,
    /// Continuous, selected by discrete variables
    Hybrid,
}

/// A factor of any kind
#[derive(Debug, Clone, PartialEq)]
pub enum Factor {
    /// Linear Gaussian factor
    Gaussian(GaussianFactor),
    /// Discrete potential table
    Discrete(DiscreteFactor),
    /// Gaussian mixture factor
    Hybrid(HybridGaussianFactor),
}

impl Factor {
    /// Kind discriminant
    pub fn kind(&self) -> Kind {
        match self {
            Factor::Gaussian(_) => Kind::Gaussian,
            Factor::Discrete(_) => Kind::Discrete,
            Factor::Hybrid(_) => Kind::Hybrid,
        }
    }

    /// All keys, continuous first
    pub fn keys(&self) -> Vec<Key> {
        match self {
            Factor::Gaussian(f) => f.keys().to_vec(),
            Factor::Discrete(f) => f.keys().iter().map(|k| k.key).collect(),
            Factor::Hybrid(f) => f.keys(),
        }
    }

    /// Continuous keys
    pub fn continuous_keys(&self) -> &[Key] {
        match self {
            Factor::Gaussian(f) => f.keys(),
            Factor::Discrete(_) => &[],
            Factor::Hybrid(f) => f.continuous_keys(),
        }
    }

    /// Discrete keys with cardinalities
    pub fn discrete_keys(&self) -> &[DiscreteKey] {
        match self {
            Factor::Gaussian(_) => &[],
            Factor::Discrete(f) => f.keys(),
            Factor::Hybrid(f) => f.discrete_keys(),
        }
    }

    /// Whether the factor involves a key
    pub fn involves(&self, key: Key) -> bool {
        match self {
            Factor::Gaussian(f) => f.involves(key),
            Factor::Discrete(f) => f.involves(key),
            Factor::Hybrid(f) => f.involves(key),
        }
    }

    /// Same kind and contents within `tol`
    pub fn equals(&self, other: &Factor, tol: f64) -> bool {
        match (self, other) {
            (Factor::Gaussian(a), Factor::Gaussian(b)) => a.equals(b, tol),
            (Factor::Discrete(a), Factor::Discrete(b)) => a.equals(b, tol),
            (Factor::Hybrid(a), Factor::Hybrid(b)) => a.equals(b, tol),
            _ => false,
        }
    }
}

impl From<GaussianFactor> for Factor {
    fn from(f: GaussianFactor) -> Self {
        Factor::Gaussian(f)
    }
}

impl From<DiscreteFactor> for Factor {
    fn from(f: DiscreteFactor) -> Self {
        Factor::Discrete(f)
    }
}

impl From<HybridGaussianFactor> for Factor {
    fn from(f: HybridGaussianFactor) -> Self {
        Factor::Hybrid(f)
    }
}
