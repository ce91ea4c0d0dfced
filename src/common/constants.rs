//! Numerical constants used throughout elimination and back-substitution
//!
//! These are fixed numeric thresholds. User-tunable tolerances live in
//! [`EliminationConfig`](crate::inference::EliminationConfig).

/// Minimum magnitude for a hard-constraint row to act as a pivot
///
/// A constrained (zero-sigma) row whose entry in the pivot column is below
/// this value does not take part in pivoting for that column.
pub const CONSTRAINT_PIVOT_EPSILON: f64 = 1e-9;

/// Default minimum pivot precision before a column is declared rank-deficient
///
/// Precision here is the whitened squared column norm `Σ wᵢ aᵢ²`.
pub const DEFAULT_RANK_TOLERANCE: f64 = 1e-9;

/// Tolerance below which a residual hard-constraint row is considered consumed
///
/// A hard row left with zero Jacobian but a non-zero right-hand side beyond
/// this value means the constraints are mutually inconsistent.
pub const CONSTRAINT_RESIDUAL_EPSILON: f64 = 1e-9;

/// Default tolerance used by `equals` comparisons in tests and the tree
pub const DEFAULT_EQUALS_TOLERANCE: f64 = 1e-9;
