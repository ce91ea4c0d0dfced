//! Fixture-driven scenarios
//!
//! Each scenario is eliminated in batch from its first factor batch and then
//! updated with the remaining batches, checking the removal statistics of
//! every update and the final solution.

use isam_rs::{DebugReporter, Isam, IsamConfig, Ordering, OrderingPolicy};

use crate::helpers::assertions::{assert_tree_consistent, assert_values_close};
use crate::helpers::fixtures::{
    build_graph, expected_assignment, expected_solution, load_scenario, Scenario,
};

const TOLERANCE: f64 = 1e-9;

fn config() -> IsamConfig {
    IsamConfig::default()
        .with_ordering(OrderingPolicy::Natural)
        .with_check_invariants(true)
}

fn run_scenario(scenario: &Scenario) -> (Isam, DebugReporter) {
    let first = build_graph(&scenario.batches[0]);
    let mut isam = match &scenario.initial_ordering {
        Some(keys) => {
            Isam::from_graph_with_ordering(&first, &Ordering::from_keys(keys.iter().copied()), config())
        }
        None => Isam::from_graph(&first, config()),
    }
    .unwrap_or_else(|e| panic!("{}: batch elimination failed: {}", scenario.name, e));

    let mut reporter = DebugReporter::new();
    for (i, batch) in scenario.batches[1..].iter().enumerate() {
        isam.update_with_reporter(build_graph(batch), &mut reporter)
            .unwrap_or_else(|e| panic!("{}: update {} failed: {}", scenario.name, i, e));
    }
    (isam, reporter)
}

fn check_scenario(name: &str) {
    let scenario = load_scenario(name);
    let (isam, reporter) = run_scenario(&scenario);
    let expected = &scenario.expected;

    let removed: Vec<usize> = reporter.results().iter().map(|r| r.removed_cliques).collect();
    let orphans: Vec<usize> = reporter.results().iter().map(|r| r.orphans).collect();
    assert_eq!(removed, expected.removed_cliques, "{}: removed cliques", name);
    assert_eq!(orphans, expected.orphans, "{}: orphans", name);
    assert!(reporter.failures().is_empty());

    let keys = isam.tree().keys();
    assert_eq!(keys.len(), expected.variables, "{}: variables", name);
    assert_tree_consistent(isam.tree(), &keys);

    let solution = isam.optimize(&expected_assignment(expected)).unwrap();
    assert_values_close(&solution, &expected_solution(expected), TOLERANCE, name);
}

#[test]
fn test_chain_update_scenario() {
    check_scenario("chain_update");
}

#[test]
fn test_constrained_chain_scenario() {
    check_scenario("constrained_chain");
}

#[test]
fn test_hybrid_mode_scenario() {
    check_scenario("hybrid_mode");
}

#[test]
fn test_chain_update_keeps_x1_clique() {
    let scenario = load_scenario("chain_update");
    let first = build_graph(&scenario.batches[0]);
    let mut isam =
        Isam::from_graph_with_ordering(&first, &Ordering::from_keys([1, 2]), config()).unwrap();
    assert_eq!(isam.tree().len(), 2);
    let x1 = isam.tree().find(1).unwrap();
    let x1_conditional = isam.tree().clique(x1).unwrap().conditional().clone();

    let mut reporter = DebugReporter::new();
    isam.update_with_reporter(build_graph(&scenario.batches[1]), &mut reporter)
        .unwrap();

    // Only x2's clique was freed; x1's clique survives untouched
    assert_eq!(reporter.removals(), &[(1, 1, 1)]);
    assert_eq!(reporter.orderings()[0].keys(), vec![2, 3]);
    assert_eq!(isam.tree().find(1), Some(x1));
    assert!(isam
        .tree()
        .clique(x1)
        .unwrap()
        .conditional()
        .equals(&x1_conditional, 0.0));
    assert_eq!(isam.tree().len(), 3);
}
