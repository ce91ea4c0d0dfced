//! Error types for elimination, tree maintenance and solving
//!
//! Every fallible operation returns [`InferenceError`]. Structural failures
//! are grouped under [`StructuralError`] since they all mean the Bayes tree
//! can no longer be trusted.

use thiserror::Error;

use crate::types::{Key, KeyDisplay};

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, InferenceError>;

/// Errors that can occur during inference
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// A Bayes tree invariant is violated
    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),

    /// Elimination hit a rank-deficient or inconsistent block
    #[error("Numeric degeneracy at {}: {description}", KeyDisplay::of(.key))]
    NumericDegeneracy {
        /// Variable being eliminated
        key: Key,
        /// Description of the failure
        description: String,
    },

    /// A hard equality factor was linearized away from its feasible point
    #[error("Linearization point not feasible for {}", KeyDisplay::of(.key))]
    InfeasibleLinearization {
        /// Constrained variable
        key: Key,
    },

    /// The ordering does not fit the factor graph
    #[error("Invalid ordering: {description}")]
    InvalidOrdering {
        /// Description of the problem
        description: String,
    },

    /// Two factors disagree on the dimension of a variable
    #[error("Dimension mismatch for {}: expected {expected}, got {actual}", KeyDisplay::of(.key))]
    DimensionMismatch {
        /// Variable with conflicting dimensions
        key: Key,
        /// Dimension seen first
        expected: usize,
        /// Conflicting dimension
        actual: usize,
    },

    /// A variable needed for the computation is absent
    #[error("Unknown key {}", KeyDisplay::of(.0))]
    UnknownKey(Key),

    /// A previous update failed after it started modifying the tree
    #[error("Bayes tree was invalidated by a failed update")]
    InvalidatedTree,
}

/// Violations of the Bayes tree invariants
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructuralError {
    /// Separator variables are owned by cliques on different root paths
    #[error("no unique parent clique for separator {separator:?} of {}", KeyDisplay::of(.frontal))]
    NoUniqueParent {
        /// First frontal variable of the clique being placed
        frontal: Key,
        /// Separator that could not be placed
        separator: Vec<Key>,
    },

    /// A separator variable is not frontal anywhere in the tree
    #[error("separator variable {} is not in the tree", KeyDisplay::of(.key))]
    MissingSeparatorKey {
        /// Missing variable
        key: Key,
    },

    /// A variable would become frontal in two cliques
    #[error("variable {} is already frontal in another clique", KeyDisplay::of(.key))]
    DuplicateFrontal {
        /// Duplicated variable
        key: Key,
    },

    /// An orphan could not be hung below a single clique of the new tree
    #[error("orphan with separator {separator:?} spans disjoint subtrees")]
    OrphanReattachment {
        /// Separator of the orphan
        separator: Vec<Key>,
    },

    /// An invariant check found an inconsistency
    #[error("invariant broken: {description}")]
    BrokenInvariant {
        /// Description of the inconsistency
        description: String,
    },
}

impl InferenceError {
    /// Whether the error leaves the tree unusable
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            InferenceError::Structural(_) | InferenceError::InvalidatedTree
        )
    }
}
