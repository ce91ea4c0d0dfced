//! Hybrid trees: mixtures keyed by a discrete mode

use nalgebra::dvector;

use isam_rs::{
    Conditional, DiscreteFactor, DiscreteKey, DiscreteValues, FactorGraph, GaussianFactor,
    HybridGaussianFactor, InferenceError, Isam, IsamConfig, OrderingPolicy,
};

use crate::helpers::assertions::assert_scalar_close;

const MODE: u64 = 100;
const Y: u64 = 1;

fn mode() -> DiscreteKey {
    DiscreteKey::new(MODE, 2)
}

/// Uniform prior on the mode and y ~ N(-1, 1) or N(4, 1) depending on it
fn mixture_graph() -> FactorGraph {
    let mut graph = FactorGraph::new();
    graph.push(DiscreteFactor::from_table(vec![mode()], "1 1").unwrap());
    graph.push(
        HybridGaussianFactor::new(
            vec![mode()],
            vec![
                GaussianFactor::prior(Y, dvector![-1.0], 1.0),
                GaussianFactor::prior(Y, dvector![4.0], 1.0),
            ],
        )
        .unwrap(),
    );
    graph
}

fn config() -> IsamConfig {
    IsamConfig::default()
        .with_ordering(OrderingPolicy::Natural)
        .with_check_invariants(true)
}

fn assignment(m: usize) -> DiscreteValues {
    [(MODE, m)].into_iter().collect()
}

fn mode_probability(isam: &Isam, m: usize) -> f64 {
    isam.tree()
        .conditional_of(MODE)
        .and_then(Conditional::as_discrete)
        .unwrap()
        .evaluate(&assignment(m))
        .unwrap()
}

#[test]
fn test_choose_selects_only_matching_branch() {
    let isam = Isam::from_graph(&mixture_graph(), config()).unwrap();
    let mixture = isam
        .tree()
        .conditional_of(Y)
        .and_then(Conditional::as_mixture)
        .unwrap();
    let branch0 = mixture.choose(&assignment(0)).unwrap();
    let branch1 = mixture.choose(&assignment(1)).unwrap();

    let net = isam.choose(&assignment(0)).unwrap();
    assert_eq!(net.len(), 1);
    assert!(net.conditionals()[0].equals(branch0, 0.0));
    assert!(!net.conditionals()[0].equals(branch1, 1e-6));

    let y = isam.optimize(&assignment(0)).unwrap();
    assert_scalar_close(y.get(Y).unwrap()[0], -1.0, 1e-12, "y | m=0");
    let y = isam.optimize(&assignment(1)).unwrap();
    assert_scalar_close(y.get(Y).unwrap()[0], 4.0, 1e-12, "y | m=1");
}

#[test]
fn test_prior_mode_stays_uniform() {
    let isam = Isam::from_graph(&mixture_graph(), config()).unwrap();
    assert_scalar_close(mode_probability(&isam, 0), 0.5, 1e-12, "P(m=0)");
    assert_scalar_close(mode_probability(&isam, 1), 0.5, 1e-12, "P(m=1)");
}

#[test]
fn test_measurement_shifts_mode_posterior() {
    let mut isam = Isam::from_graph(&mixture_graph(), config()).unwrap();
    let mut measurement = FactorGraph::new();
    measurement.push(GaussianFactor::prior(Y, dvector![4.0], 1.0));
    let result = isam.update(measurement).unwrap();
    assert_eq!(result.removed_cliques, 2);

    // branch 0 fits the measurement with error ½(2.5² + 2.5²)
    let expected = 1.0 / (1.0 + (-6.25f64).exp());
    assert_scalar_close(mode_probability(&isam, 1), expected, 1e-9, "P(m=1 | z)");

    let y = isam.optimize(&assignment(0)).unwrap();
    assert_scalar_close(y.get(Y).unwrap()[0], 1.5, 1e-12, "y | m=0, z");
}

#[test]
fn test_missing_mode_in_assignment() {
    let isam = Isam::from_graph(&mixture_graph(), config()).unwrap();
    assert_eq!(
        isam.optimize(&DiscreteValues::new()).unwrap_err(),
        InferenceError::UnknownKey(MODE)
    );
}
