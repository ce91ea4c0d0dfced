//! Elimination of factor graphs into Bayes nets
//!
//! - [`Ordering`] - elimination order, with natural and min-degree builders
//! - [`eliminate`] - factor graph + ordering to [`BayesNet`]
//! - [`GaussianBayesNet`] - back-substitution and covariance recovery
//! - [`InferenceError`] - error type shared by the whole crate

pub mod bayes_net;
pub mod config;
pub mod elimination;
pub mod errors;
pub mod ordering;

pub use bayes_net::{BayesNet, GaussianBayesNet};
pub use config::{EliminationConfig, EliminationMode, IsamConfig, OrderingPolicy};
pub use elimination::eliminate;
pub use errors::{InferenceError, Result, StructuralError};
pub use ordering::{Group, Ordering};
