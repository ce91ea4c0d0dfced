//! Incremental updates against batch elimination of the same factors

use isam_rs::{
    BayesTree, DiscreteValues, EliminationConfig, Isam, IsamConfig, Ordering, OrderingPolicy,
};

use crate::helpers::assertions::{assert_dmatrix_close, assert_values_close};
use crate::helpers::fixtures::{build_graph, load_scenario, merged_graph};
use crate::helpers::random::{merge, random_walk, WalkParams};

fn config(ordering: OrderingPolicy) -> IsamConfig {
    IsamConfig::default()
        .with_ordering(ordering)
        .with_check_invariants(true)
}

fn batch_tree(graph: &isam_rs::FactorGraph) -> BayesTree {
    let ordering = Ordering::natural(graph).unwrap();
    let net = isam_rs::eliminate(graph, &ordering, &EliminationConfig::default()).unwrap();
    BayesTree::from_bayes_net(net).unwrap()
}

#[test]
fn test_incremental_matches_batch_tree() {
    for name in ["chain_update", "constrained_chain"] {
        let scenario = load_scenario(name);
        let first = build_graph(&scenario.batches[0]);
        let mut isam = Isam::from_graph(&first, config(OrderingPolicy::Natural)).unwrap();
        for batch in &scenario.batches[1..] {
            isam.update(build_graph(batch)).unwrap();
        }

        let batch = batch_tree(&merged_graph(&scenario));
        assert!(
            isam.tree().equals(&batch, 1e-9),
            "{}: incremental tree differs from batch tree",
            name
        );
    }
}

#[test]
fn test_random_walk_matches_batch_solution() {
    let params = WalkParams::default();
    for seed in [1, 7, 42] {
        let (batches, keys) = random_walk(seed, params);
        let mut isam = Isam::new(config(OrderingPolicy::MinDegree));
        for batch in &batches {
            isam.update(batch.clone()).unwrap();
        }

        let batch = Isam::from_graph(&merge(&batches), config(OrderingPolicy::Natural)).unwrap();
        let empty = DiscreteValues::new();
        assert_values_close(
            &isam.optimize(&empty).unwrap(),
            &batch.optimize(&empty).unwrap(),
            1e-8,
            &format!("seed {}", seed),
        );

        let incremental_net = isam.choose(&empty).unwrap();
        let batch_net = batch.choose(&empty).unwrap();
        for window in keys.windows(2) {
            assert_dmatrix_close(
                &incremental_net.marginal_covariance(window).unwrap(),
                &batch_net.marginal_covariance(window).unwrap(),
                1e-8,
                &format!("seed {} covariance {:?}", seed, window),
            );
        }
    }
}

#[test]
fn test_single_update_equals_batch_start() {
    let (batches, _) = random_walk(3, WalkParams::default());
    let graph = merge(&batches);

    let mut from_empty = Isam::new(config(OrderingPolicy::Natural));
    from_empty.update(graph.clone()).unwrap();
    let batch = Isam::from_graph(&graph, config(OrderingPolicy::Natural)).unwrap();

    assert!(from_empty.tree().equals(batch.tree(), 1e-12));
}
