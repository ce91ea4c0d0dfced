//! Core value types
//!
//! # Types
//!
//! - [`Key`] - Opaque variable identifier, with [`symbol`] for readable keys
//! - [`DiscreteKey`] - Discrete variable key with its cardinality
//! - [`DiscreteValues`] - Assignment of states to discrete variables
//! - [`VectorValues`] - Continuous point estimate per variable

pub mod key;
pub mod values;

pub use key::{symbol, DiscreteKey, Key, KeyDisplay};
pub use values::{DiscreteValues, VectorValues};
