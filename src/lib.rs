/*!
# isam-rs - Incremental inference on Bayes trees

Rust implementation of incremental smoothing and mapping (iSAM) over factor
graphs with Gaussian, discrete and hybrid (discrete-conditioned Gaussian)
factors.

## Features

- Variable elimination into Bayes nets, with hard equality constraints
- Sum-product and max-product elimination of discrete variables
- Hybrid elimination producing Gaussian mixtures keyed by discrete assignments
- Bayes tree maintenance: insert, remove-top, orphan reattachment
- Incremental updates that only re-eliminate the affected top of the tree

## Modules

- [`factors`] - Gaussian, discrete and hybrid factors and factor graphs
- [`conditionals`] - Conditionals produced by elimination
- [`inference`] - Orderings, elimination, Bayes nets, errors and configuration
- [`tree`] - Bayes tree of cliques
- [`isam`] - Incremental updater
- [`reporter`] - Observability hooks for updates
- [`nonlinear`] - Manifold values and equality factors
- [`common`] - Low-level numerics

## Example

```rust
use isam_rs::{symbol, DiscreteValues, FactorGraph, GaussianFactor, Isam, IsamConfig};
use nalgebra::dvector;

let x1 = symbol('x', 1);
let x2 = symbol('x', 2);
let x3 = symbol('x', 3);

let mut graph = FactorGraph::new();
graph.push(GaussianFactor::prior(x1, dvector![0.0], 1.0));
graph.push(GaussianFactor::between(x1, x2, dvector![1.0], 1.0));
let mut isam = Isam::from_graph(&graph, IsamConfig::default()).unwrap();

// Only the top of the tree around x2 is re-eliminated
let mut odometry = FactorGraph::new();
odometry.push(GaussianFactor::between(x2, x3, dvector![1.0], 1.0));
isam.update(odometry).unwrap();

let estimate = isam.optimize(&DiscreteValues::new()).unwrap();
assert!((estimate.get(x3).unwrap()[0] - 2.0).abs() < 1e-9);
```
*/

// ============================================================================
// Core modules
// ============================================================================

/// Low-level utilities (linear algebra, constants)
pub mod common;

/// Keys and value containers
pub mod types;

/// Factors and factor graphs
pub mod factors;

/// Conditionals produced by elimination
pub mod conditionals;

/// Orderings, elimination, Bayes nets, errors and configuration
pub mod inference;

/// Bayes tree of cliques
pub mod tree;

/// Incremental updater
pub mod isam;

/// Observability hooks for incremental updates
pub mod reporter;

/// Manifold values and equality factors
pub mod nonlinear;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// Keys and values
pub use types::{symbol, DiscreteKey, DiscreteValues, Key, KeyDisplay, VectorValues};

// Factors
pub use factors::{
    DecisionTree, DiscreteFactor, Factor, FactorGraph, GaussianFactor, HybridGaussianFactor,
    Kind, NoiseModel,
};

// Conditionals
pub use conditionals::{Conditional, DiscreteConditional, GaussianConditional, GaussianMixture};

// Inference
pub use inference::{
    eliminate, BayesNet, EliminationConfig, EliminationMode, GaussianBayesNet, IsamConfig,
    Ordering, OrderingPolicy,
};

// Errors
pub use inference::{InferenceError, Result, StructuralError};

// Tree and updater
pub use isam::{Isam, UpdateResult};
pub use tree::{BayesTree, Clique, CliqueId, Orphans};

// Reporters
pub use reporter::{
    CompositeReporter, DebugReporter, LoggingReporter, NoOpReporter, UpdateReporter,
};

// Nonlinear
pub use nonlinear::{Angle, EqualityMode, Manifold, NonlinearEquality};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
