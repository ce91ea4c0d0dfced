//! Scenario fixture loading and conversion to factor graphs
//!
//! Scenarios are JSON files under `tests/data/scenarios/`. Each holds a list
//! of factor batches: the first batch is eliminated in batch, the remaining
//! ones are fed to `Isam::update` one at a time.

use nalgebra::{DMatrix, DVector};
use serde::Deserialize;
use std::fs;

use isam_rs::{
    DiscreteFactor, DiscreteKey, DiscreteValues, FactorGraph, GaussianFactor,
    HybridGaussianFactor, Key, NoiseModel, VectorValues,
};

//=============================================================================
// Fixture Types
//=============================================================================

/// One factor as written in a fixture
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FactorSpec {
    /// `x = mean`
    Prior {
        key: Key,
        mean: Vec<f64>,
        sigma: f64,
    },
    /// `to - from = delta`
    Between {
        from: Key,
        to: Key,
        delta: Vec<f64>,
        sigma: f64,
    },
    /// Hard `x = value`
    Equality { key: Key, value: Vec<f64> },
    /// Discrete table, first key most significant
    Discrete {
        keys: Vec<(Key, usize)>,
        table: String,
    },
    /// One prior on `key` per state of `mode`
    Mixture {
        key: Key,
        mode: (Key, usize),
        means: Vec<Vec<f64>>,
        sigma: f64,
    },
}

/// Expected outcome of a scenario
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Expected {
    /// Removed cliques per incremental batch
    #[serde(default)]
    pub removed_cliques: Vec<usize>,
    /// Orphans per incremental batch
    #[serde(default)]
    pub orphans: Vec<usize>,
    /// Variables in the final tree
    pub variables: usize,
    /// Discrete assignment used to solve
    #[serde(default)]
    pub assignment: Vec<(Key, usize)>,
    /// Final continuous solution
    #[serde(default)]
    pub solution: Vec<(Key, Vec<f64>)>,
}

/// A complete scenario fixture
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// Ordering for the first batch; the configured policy is used if absent
    #[serde(default)]
    pub initial_ordering: Option<Vec<Key>>,
    pub batches: Vec<Vec<FactorSpec>>,
    pub expected: Expected,
}

//=============================================================================
// Loading
//=============================================================================

/// Path of a named scenario fixture
pub fn scenario_path(name: &str) -> String {
    format!("tests/data/scenarios/{}.json", name)
}

/// Generic fixture loading helper
pub fn load_fixture_from_path<T: serde::de::DeserializeOwned>(path: &str) -> T {
    let fixture_data = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path, e));
    serde_json::from_str(&fixture_data).unwrap_or_else(|e| panic!("Failed to parse fixture: {}", e))
}

/// Load a named scenario
pub fn load_scenario(name: &str) -> Scenario {
    load_fixture_from_path(&scenario_path(name))
}

//=============================================================================
// Conversion
//=============================================================================

fn discrete_keys(keys: &[(Key, usize)]) -> Vec<DiscreteKey> {
    keys.iter().map(|&(k, c)| DiscreteKey::new(k, c)).collect()
}

/// Build the factor described by a spec
pub fn build_factor(spec: &FactorSpec) -> isam_rs::Factor {
    match spec {
        FactorSpec::Prior { key, mean, sigma } => {
            GaussianFactor::prior(*key, DVector::from_vec(mean.clone()), *sigma).into()
        }
        FactorSpec::Between {
            from,
            to,
            delta,
            sigma,
        } => GaussianFactor::between(*from, *to, DVector::from_vec(delta.clone()), *sigma).into(),
        FactorSpec::Equality { key, value } => {
            let dim = value.len();
            GaussianFactor::unary(
                *key,
                DMatrix::identity(dim, dim),
                DVector::from_vec(value.clone()),
                NoiseModel::constrained_all(dim),
            )
            .expect("equality factor")
            .into()
        }
        FactorSpec::Discrete { keys, table } => {
            DiscreteFactor::from_table(discrete_keys(keys), table)
                .expect("discrete factor")
                .into()
        }
        FactorSpec::Mixture {
            key,
            mode,
            means,
            sigma,
        } => {
            let components = means
                .iter()
                .map(|m| GaussianFactor::prior(*key, DVector::from_vec(m.clone()), *sigma))
                .collect();
            HybridGaussianFactor::new(discrete_keys(&[*mode]), components)
                .expect("mixture factor")
                .into()
        }
    }
}

/// Build a factor graph from a batch of specs
pub fn build_graph(batch: &[FactorSpec]) -> FactorGraph {
    batch.iter().map(build_factor).collect()
}

/// All batches merged into one graph
pub fn merged_graph(scenario: &Scenario) -> FactorGraph {
    scenario
        .batches
        .iter()
        .flat_map(|batch| batch.iter().map(build_factor))
        .collect()
}

/// Expected discrete assignment
pub fn expected_assignment(expected: &Expected) -> DiscreteValues {
    expected.assignment.iter().copied().collect()
}

/// Expected continuous solution
pub fn expected_solution(expected: &Expected) -> VectorValues {
    expected
        .solution
        .iter()
        .map(|(k, v)| (*k, DVector::from_vec(v.clone())))
        .collect()
}
