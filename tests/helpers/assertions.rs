//! Assertion functions for numerical and structural comparisons
//!
//! These functions eliminate duplicate comparison code across test files.

use nalgebra::{DMatrix, DVector};

use isam_rs::{BayesTree, Key, KeyDisplay, VectorValues};

/// Compare scalar values with tolerance
pub fn assert_scalar_close(actual: f64, expected: f64, tolerance: f64, field_name: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{}: expected {}, got {} (diff: {}, tolerance: {})",
        field_name,
        expected,
        actual,
        diff,
        tolerance
    );
}

/// Compare DVector with tolerance
pub fn assert_dvector_close(
    actual: &DVector<f64>,
    expected: &DVector<f64>,
    tolerance: f64,
    field_name: &str,
) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{}: dimension mismatch (actual: {}, expected: {})",
        field_name,
        actual.len(),
        expected.len()
    );

    for i in 0..actual.len() {
        assert_scalar_close(actual[i], expected[i], tolerance, &format!("{}[{}]", field_name, i));
    }
}

/// Compare DMatrix with tolerance
pub fn assert_dmatrix_close(
    actual: &DMatrix<f64>,
    expected: &DMatrix<f64>,
    tolerance: f64,
    field_name: &str,
) {
    assert_eq!(
        actual.shape(),
        expected.shape(),
        "{}: shape mismatch (actual: {:?}, expected: {:?})",
        field_name,
        actual.shape(),
        expected.shape()
    );

    for i in 0..actual.nrows() {
        for j in 0..actual.ncols() {
            assert_scalar_close(
                actual[(i, j)],
                expected[(i, j)],
                tolerance,
                &format!("{}[{},{}]", field_name, i, j),
            );
        }
    }
}

/// Compare two solutions variable by variable
pub fn assert_values_close(
    actual: &VectorValues,
    expected: &VectorValues,
    tolerance: f64,
    field_name: &str,
) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{}: variable count mismatch",
        field_name
    );
    for (key, value) in expected.iter() {
        let got = actual
            .get(key)
            .unwrap_or_else(|| panic!("{}: missing {}", field_name, KeyDisplay(key)));
        assert_dvector_close(got, value, tolerance, &format!("{} {}", field_name, KeyDisplay(key)));
    }
}

/// Check invariants and that every expected key is frontal in exactly one clique
pub fn assert_tree_consistent(tree: &BayesTree, keys: &[Key]) {
    tree.check_invariants()
        .unwrap_or_else(|e| panic!("tree invariants: {}", e));
    for &key in keys {
        let owners = tree
            .cliques()
            .filter(|(_, clique)| clique.frontals().contains(&key))
            .count();
        assert_eq!(owners, 1, "{} is frontal in {} cliques", KeyDisplay(key), owners);
    }
    assert_eq!(tree.num_variables(), keys.len(), "variable count");
}
