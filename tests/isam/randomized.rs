//! Randomized update sequences
//!
//! Every update is followed by a full invariant check: index consistency,
//! two-way links, running intersection and reachability of every clique.

use std::collections::BTreeSet;

use isam_rs::{
    CompositeReporter, DebugReporter, FactorGraph, Isam, IsamConfig, Key, LoggingReporter,
    OrderingPolicy,
};

use crate::helpers::assertions::assert_tree_consistent;
use crate::helpers::random::{random_walk, WalkParams};

fn run_walk(seed: u64, params: WalkParams, ordering: OrderingPolicy) {
    let (batches, _) = random_walk(seed, params);
    let config = IsamConfig::default()
        .with_ordering(ordering)
        .with_check_invariants(true);
    let mut isam = Isam::new(config);
    let mut reporter = CompositeReporter::new(DebugReporter::new(), LoggingReporter::new());
    let mut seen: BTreeSet<Key> = BTreeSet::new();

    for (step, batch) in batches.into_iter().enumerate() {
        seen.extend(batch.keys());
        let result = isam
            .update_with_reporter(batch, &mut reporter)
            .unwrap_or_else(|e| panic!("seed {} step {}: {}", seed, step, e));

        let keys: Vec<Key> = seen.iter().copied().collect();
        assert_tree_consistent(isam.tree(), &keys);
        assert_eq!(result.variables, keys.len());
        assert_eq!(result.cliques, isam.tree().len());

        // every orphan hangs below exactly one clique again
        assert!(reporter.first().failures().is_empty());
        for (id, clique) in isam.tree().cliques() {
            let path = isam.tree().path_to_root(id);
            let root = *path.last().unwrap();
            assert!(isam.tree().roots().contains(&root));
            assert_eq!(clique.is_root(), path.len() == 1);
        }
    }
    assert!(isam.is_valid());
}

#[test]
fn test_random_sequences_min_degree() {
    for seed in 0..8 {
        run_walk(seed, WalkParams::default(), OrderingPolicy::MinDegree);
    }
}

#[test]
fn test_random_sequences_natural() {
    for seed in 100..104 {
        run_walk(seed, WalkParams::default(), OrderingPolicy::Natural);
    }
}

#[test]
fn test_random_sequences_scalar_dense_loops() {
    let params = WalkParams {
        steps: 40,
        dim: 1,
        loop_probability: 0.8,
        merge_probability: 0.4,
    };
    for seed in 200..204 {
        run_walk(seed, params, OrderingPolicy::MinDegree);
    }
}

#[test]
fn test_empty_update_leaves_tree_untouched() {
    let (batches, keys) = random_walk(11, WalkParams::default());
    let mut isam = Isam::new(IsamConfig::default().with_check_invariants(true));
    for batch in batches {
        isam.update(batch).unwrap();
    }

    let before = isam.tree().clone();
    let owners: Vec<_> = keys.iter().map(|&k| isam.tree().find(k)).collect();

    let result = isam.update(FactorGraph::new()).unwrap();
    assert_eq!(result.removed_cliques, 0);
    assert_eq!(result.orphans, 0);
    assert!(isam.tree().equals(&before, 0.0));
    let after: Vec<_> = keys.iter().map(|&k| isam.tree().find(k)).collect();
    assert_eq!(owners, after);
    for (id, clique) in before.cliques() {
        let now = isam.tree().clique(id).unwrap();
        assert!(now.conditional().equals(clique.conditional(), 0.0));
        assert_eq!(now.parent(), clique.parent());
    }
}
