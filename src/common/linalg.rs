//! Linear algebra utilities
//!
//! Pivoting, row compression and triangular solves used by Gaussian
//! elimination and back-substitution.

use nalgebra::{DMatrix, DVector};

use super::constants::CONSTRAINT_PIVOT_EPSILON;

/// Outcome of choosing a pivot for one column of a weighted system
#[derive(Debug, Clone)]
pub enum Pivot {
    /// A hard row carries the column; the pivot row is that row scaled by `1 / coeff`
    Constrained {
        /// Index of the constrained row
        row: usize,
        /// Entry of that row in the pivot column
        coeff: f64,
    },
    /// Soft rows carry the column through the weighted pseudo-inverse
    Soft {
        /// Weighted pseudo-inverse of the column (`w ∘ a / precision`)
        pseudo: DVector<f64>,
        /// Whitened squared norm of the column
        precision: f64,
    },
    /// No row carries enough of the column
    Degenerate {
        /// Precision that fell below tolerance
        precision: f64,
    },
}

/// Compute the weighted pseudo-inverse of a column
///
/// Rows with infinite weight are hard constraints: if any of them has a
/// non-negligible entry, the one with the largest magnitude becomes the
/// pivot. Otherwise the soft rows are combined with their weights.
///
/// # Arguments
/// * `column` - Pivot column of the stacked system
/// * `weights` - Per-row weights (`1/σ²`, infinite for hard rows)
/// * `active` - Rows still taking part in elimination
/// * `tolerance` - Minimum precision for a soft pivot
pub fn weighted_pivot(
    column: &DVector<f64>,
    weights: &[f64],
    active: &[bool],
    tolerance: f64,
) -> Pivot {
    let mut best: Option<(usize, f64)> = None;
    for (i, (&a, &w)) in column.iter().zip(weights).enumerate() {
        if !active[i] || !w.is_infinite() || a.abs() <= CONSTRAINT_PIVOT_EPSILON {
            continue;
        }
        if best.map_or(true, |(_, b)| a.abs() > b.abs()) {
            best = Some((i, a));
        }
    }
    if let Some((row, coeff)) = best {
        return Pivot::Constrained { row, coeff };
    }

    let mut precision = 0.0;
    for (i, (&a, &w)) in column.iter().zip(weights).enumerate() {
        if active[i] && w.is_finite() {
            precision += w * a * a;
        }
    }
    if precision < tolerance {
        return Pivot::Degenerate { precision };
    }

    let pseudo = DVector::from_iterator(
        column.len(),
        column.iter().zip(weights).enumerate().map(|(i, (&a, &w))| {
            if active[i] && w.is_finite() {
                w * a / precision
            } else {
                0.0
            }
        }),
    );
    Pivot::Soft { pseudo, precision }
}

/// Compress whitened rows `[A | b]` into an equivalent upper-trapezoidal block
///
/// The result `R` satisfies `‖R [x; -1]‖² = ‖[A | b] [x; -1]‖²` for every `x`
/// and has at most `ncols` rows.
pub fn compress_rows(ab: DMatrix<f64>) -> DMatrix<f64> {
    if ab.nrows() == 0 || ab.ncols() == 0 {
        return DMatrix::zeros(0, ab.ncols());
    }
    ab.qr().r()
}

/// Solve `R x = rhs` for upper-triangular `R`
///
/// Returns `None` when a diagonal entry is zero.
pub fn solve_upper(r: &DMatrix<f64>, rhs: &DVector<f64>) -> Option<DVector<f64>> {
    if r.nrows() == 0 {
        return Some(DVector::zeros(0));
    }
    r.solve_upper_triangular(rhs)
}

/// Check if matrix is positive definite
pub fn is_positive_definite(matrix: &DMatrix<f64>) -> bool {
    matrix.clone().cholesky().is_some()
}

/// Turn negative log-values into positive weights, scaled so the largest is 1
///
/// Used when a continuous elimination leaves only a discrete residual.
pub fn weights_from_neg_log(neg_log: &[f64]) -> Vec<f64> {
    let min = neg_log.iter().cloned().fold(f64::INFINITY, f64::min);
    if !min.is_finite() {
        return vec![0.0; neg_log.len()];
    }
    neg_log.iter().map(|v| (min - v).exp()).collect()
}

/// Maximum absolute element-wise difference between two matrices of equal shape
pub fn max_abs_diff(a: &DMatrix<f64>, b: &DMatrix<f64>) -> Option<f64> {
    if a.shape() != b.shape() {
        return None;
    }
    Some(
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max),
    )
}

/// Check that two matrices have equal shape and agree within `tol`
pub fn matrices_equal(a: &DMatrix<f64>, b: &DMatrix<f64>, tol: f64) -> bool {
    max_abs_diff(a, b).map_or(false, |d| d <= tol)
}

/// Check that two vectors have equal length and agree within `tol`
pub fn vectors_equal(a: &DVector<f64>, b: &DVector<f64>, tol: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= tol)
}
