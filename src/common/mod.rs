//! Common utilities shared by the elimination and solving code.
//!
//! This module contains linear algebra helpers and numerical constants
//! used by the factor, conditional and elimination implementations.

pub mod constants;
pub mod linalg;
