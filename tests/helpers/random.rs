//! Randomized factor graph sequences
//!
//! Generates pose-graph style batches with seeded `StdRng`, so every failure
//! is reproducible from its seed.

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use isam_rs::{FactorGraph, GaussianFactor, Key};

/// Parameters of a random walk with loop closures
#[derive(Debug, Clone, Copy)]
pub struct WalkParams {
    /// Number of poses after the first
    pub steps: usize,
    /// Dimension of every pose
    pub dim: usize,
    /// Chance of an extra loop closure at each step
    pub loop_probability: f64,
    /// Chance that a step is merged into the previous batch
    pub merge_probability: f64,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            steps: 25,
            dim: 2,
            loop_probability: 0.3,
            merge_probability: 0.2,
        }
    }
}

fn random_vector(rng: &mut StdRng, dim: usize) -> DVector<f64> {
    DVector::from_fn(dim, |_, _| rng.gen_range(-1.0..1.0))
}

/// Batches of a random walk: a prior on pose 0, then odometry and loop closures
///
/// Returns the batches and the keys of all poses.
pub fn random_walk(seed: u64, params: WalkParams) -> (Vec<FactorGraph>, Vec<Key>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut batches = Vec::new();

    let mut first = FactorGraph::new();
    first.push(GaussianFactor::prior(0, random_vector(&mut rng, params.dim), 0.5));
    batches.push(first);

    for k in 1..=params.steps as Key {
        let mut batch = FactorGraph::new();
        let sigma = rng.gen_range(0.2..1.5);
        batch.push(GaussianFactor::between(
            k - 1,
            k,
            random_vector(&mut rng, params.dim),
            sigma,
        ));
        if k > 2 && rng.gen_bool(params.loop_probability) {
            let j = rng.gen_range(0..k - 1);
            batch.push(GaussianFactor::between(
                j,
                k,
                random_vector(&mut rng, params.dim),
                1.0,
            ));
        }

        let merge = batches.len() > 1 && rng.gen_bool(params.merge_probability);
        match batches.last_mut() {
            Some(last) if merge => last.extend(batch),
            _ => batches.push(batch),
        }
    }

    let keys = (0..=params.steps as Key).collect();
    (batches, keys)
}

/// All batches merged into one graph
pub fn merge(batches: &[FactorGraph]) -> FactorGraph {
    let mut graph = FactorGraph::new();
    for batch in batches {
        graph.extend(batch.clone());
    }
    graph
}
