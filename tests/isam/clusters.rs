//! Jointly eliminated clusters in the tree
//!
//! A cluster clique carries several frontal keys. Touching one of them must
//! remove the whole clique; touching only its separator must keep it as an
//! orphan and hang it back in.

use nalgebra::dvector;

use isam_rs::inference::Group;
use isam_rs::{DiscreteValues, FactorGraph, GaussianFactor, Isam, IsamConfig, Key, Ordering, OrderingPolicy};

use crate::helpers::assertions::{assert_tree_consistent, assert_values_close};

fn config() -> IsamConfig {
    IsamConfig::default()
        .with_ordering(OrderingPolicy::Natural)
        .with_check_invariants(true)
}

/// Prior on x1 and a loop x1 - x2 - x3 - x1
fn loop_graph() -> FactorGraph {
    let mut graph = FactorGraph::new();
    graph.push(GaussianFactor::prior(1, dvector![0.0], 0.5));
    graph.push(GaussianFactor::between(1, 2, dvector![1.0], 0.3));
    graph.push(GaussianFactor::between(2, 3, dvector![1.0], 0.3));
    graph.push(GaussianFactor::between(1, 3, dvector![2.1], 0.7));
    graph
}

/// {x1, x2} | x3 below the root x3
fn clustered_isam() -> Isam {
    let ordering = Ordering::new(vec![Group::from_slice(&[1, 2]), Group::from_slice(&[3])]);
    let isam = Isam::from_graph_with_ordering(&loop_graph(), &ordering, config()).unwrap();
    assert_eq!(isam.tree().len(), 2);
    assert_eq!(isam.tree().find(1), isam.tree().find(2));
    isam
}

fn assert_matches_batch(isam: &Isam, update: &FactorGraph, keys: &[Key]) {
    assert_tree_consistent(isam.tree(), keys);
    let mut merged = loop_graph();
    merged.extend(update.clone());
    let batch = Isam::from_graph(&merged, config()).unwrap();
    let empty = DiscreteValues::new();
    assert_values_close(
        &isam.optimize(&empty).unwrap(),
        &batch.optimize(&empty).unwrap(),
        1e-9,
        "incremental vs batch",
    );
}

#[test]
fn test_update_touching_cluster_key() {
    let mut isam = clustered_isam();
    let mut update = FactorGraph::new();
    update.push(GaussianFactor::prior(2, dvector![1.2], 0.2));

    let result = isam.update(update.clone()).unwrap();
    assert_eq!(result.removed_cliques, 2);
    assert_eq!(result.orphans, 0);
    assert_eq!(result.variables, 3);
    assert_matches_batch(&isam, &update, &[1, 2, 3]);
}

#[test]
fn test_cluster_clique_survives_as_orphan() {
    let mut isam = clustered_isam();
    let cluster = isam.tree().find(1).unwrap();
    let mut update = FactorGraph::new();
    update.push(GaussianFactor::between(3, 4, dvector![1.0], 0.3));

    let result = isam.update(update.clone()).unwrap();
    assert_eq!(result.removed_cliques, 1);
    assert_eq!(result.orphans, 1);

    // kept whole and hung below the new clique of x3
    let tree = isam.tree();
    assert_eq!(tree.find(1), Some(cluster));
    assert_eq!(tree.find(2), Some(cluster));
    assert_eq!(tree.clique(cluster).unwrap().parent(), tree.find(3));
    assert_matches_batch(&isam, &update, &[1, 2, 3, 4]);
}
