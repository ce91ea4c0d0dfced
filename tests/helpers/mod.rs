//! Shared test helpers
//!
//! This module provides reusable comparison functions and scenario loading
//! to eliminate code duplication across test files.

pub mod assertions;
pub mod fixtures;
pub mod random;
