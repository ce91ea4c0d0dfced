//! Observability for incremental updates.
//!
//! This module provides the [`UpdateReporter`] trait for debugging and
//! instrumentation. Reporters receive callbacks at the phase boundaries of
//! [`Isam::update_with_reporter`](crate::Isam::update_with_reporter) without
//! touching the update logic itself.
//!
//! # Zero-Cost Abstraction
//!
//! The default [`NoOpReporter`] compiles to zero overhead - all callback
//! methods are empty and will be optimized away by the compiler.
//!
//! # Example
//!
//! ```
//! use isam_rs::{DebugReporter, FactorGraph, GaussianFactor, Isam, IsamConfig};
//! use nalgebra::dvector;
//!
//! let mut isam = Isam::new(IsamConfig::default());
//! let mut reporter = DebugReporter::new();
//!
//! let mut graph = FactorGraph::new();
//! graph.push(GaussianFactor::prior(1, dvector![0.0], 1.0));
//! isam.update_with_reporter(graph, &mut reporter).unwrap();
//!
//! assert_eq!(reporter.results().len(), 1);
//! assert_eq!(reporter.orderings()[0].keys(), vec![1]);
//! ```

use crate::factors::FactorGraph;
use crate::inference::{BayesNet, InferenceError, Ordering};
use crate::isam::UpdateResult;

// ============================================================================
// UpdateReporter Trait
// ============================================================================

/// Observability trait for incremental updates.
///
/// All methods have default empty implementations, so you only need to
/// override the events you care about. Callbacks receive references; clone
/// inside the callback if the data must be kept.
pub trait UpdateReporter {
    /// Called once the top of the tree has been planned for removal.
    ///
    /// `freed` holds the conditionals of the removed cliques as factors.
    /// The tree has not been modified yet.
    fn on_remove_top(&mut self, _removed: usize, _orphans: usize, _freed: &FactorGraph) {}

    /// Called with the ordering chosen for re-elimination.
    fn on_ordering(&mut self, _ordering: &Ordering) {}

    /// Called after re-elimination, before the tree is modified.
    fn on_eliminated(&mut self, _net: &BayesNet) {}

    /// Called after the new cliques are inserted and orphans reattached.
    fn on_update_complete(&mut self, _result: &UpdateResult) {}

    /// Called when an update fails, whether or not the tree was touched.
    fn on_update_failed(&mut self, _error: &InferenceError) {}
}

// ============================================================================
// NoOpReporter
// ============================================================================

/// Zero-cost reporter that does nothing.
///
/// Used by [`Isam::update`](crate::Isam::update).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl NoOpReporter {
    /// Create a new no-op reporter.
    pub fn new() -> Self {
        Self
    }
}

impl UpdateReporter for NoOpReporter {}

// ============================================================================
// DebugReporter
// ============================================================================

/// Reporter that captures all events for debugging.
///
/// Orderings, Bayes nets and results are cloned and stored, so memory grows
/// with every update.
#[derive(Debug, Clone, Default)]
pub struct DebugReporter {
    /// Captured removal plans (removed cliques, orphans, freed factors)
    removals: Vec<(usize, usize, usize)>,

    /// Captured orderings
    orderings: Vec<Ordering>,

    /// Captured Bayes nets from re-elimination
    nets: Vec<BayesNet>,

    /// Captured results of successful updates
    results: Vec<UpdateResult>,

    /// Captured failures
    failures: Vec<InferenceError>,
}

impl DebugReporter {
    /// Create a new debug reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all captured events.
    pub fn clear(&mut self) {
        self.removals.clear();
        self.orderings.clear();
        self.nets.clear();
        self.results.clear();
        self.failures.clear();
    }

    /// Removal plans as `(removed cliques, orphans, freed factors)`.
    pub fn removals(&self) -> &[(usize, usize, usize)] {
        &self.removals
    }

    /// Orderings used for re-elimination.
    pub fn orderings(&self) -> &[Ordering] {
        &self.orderings
    }

    /// Bayes nets produced by re-elimination.
    pub fn nets(&self) -> &[BayesNet] {
        &self.nets
    }

    /// Results of successful updates.
    pub fn results(&self) -> &[UpdateResult] {
        &self.results
    }

    /// Errors of failed updates.
    pub fn failures(&self) -> &[InferenceError] {
        &self.failures
    }

    /// Total number of captured events across all types.
    pub fn total_events(&self) -> usize {
        self.removals.len()
            + self.orderings.len()
            + self.nets.len()
            + self.results.len()
            + self.failures.len()
    }
}

impl UpdateReporter for DebugReporter {
    fn on_remove_top(&mut self, removed: usize, orphans: usize, freed: &FactorGraph) {
        self.removals.push((removed, orphans, freed.len()));
    }

    fn on_ordering(&mut self, ordering: &Ordering) {
        self.orderings.push(ordering.clone());
    }

    fn on_eliminated(&mut self, net: &BayesNet) {
        self.nets.push(net.clone());
    }

    fn on_update_complete(&mut self, result: &UpdateResult) {
        self.results.push(result.clone());
    }

    fn on_update_failed(&mut self, error: &InferenceError) {
        self.failures.push(error.clone());
    }
}

// ============================================================================
// LoggingReporter
// ============================================================================

/// Reporter that emits events through the `log` crate.
///
/// # Log Levels
///
/// - `on_update_complete`: INFO
/// - `on_remove_top`, `on_eliminated`: DEBUG
/// - `on_ordering`: TRACE (full key list only when verbose)
/// - `on_update_failed`: WARN
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReporter {
    /// Whether to include key lists in log messages
    verbose: bool,
}

impl LoggingReporter {
    /// Create a new logging reporter.
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Create a verbose logging reporter that includes key lists.
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl UpdateReporter for LoggingReporter {
    fn on_remove_top(&mut self, removed: usize, orphans: usize, freed: &FactorGraph) {
        log::debug!(
            "Remove top: {} cliques, {} orphans, {} freed factors",
            removed,
            orphans,
            freed.len()
        );
    }

    fn on_ordering(&mut self, ordering: &Ordering) {
        if self.verbose {
            log::trace!("Ordering: {:?}", ordering.keys());
        } else {
            log::trace!("Ordering: {} groups", ordering.len());
        }
    }

    fn on_eliminated(&mut self, net: &BayesNet) {
        log::debug!("Eliminated into {} conditionals", net.len());
    }

    fn on_update_complete(&mut self, result: &UpdateResult) {
        log::info!(
            "Update complete: {} cliques, {} variables",
            result.cliques,
            result.variables
        );
    }

    fn on_update_failed(&mut self, error: &InferenceError) {
        log::warn!("Update failed: {}", error);
    }
}

// ============================================================================
// CompositeReporter
// ============================================================================

/// Reporter that forwards events to two child reporters.
#[derive(Debug, Clone)]
pub struct CompositeReporter<A: UpdateReporter, B: UpdateReporter> {
    first: A,
    second: B,
}

impl<A: UpdateReporter, B: UpdateReporter> CompositeReporter<A, B> {
    /// Create a new composite reporter.
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Get a reference to the first reporter.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// Get a reference to the second reporter.
    pub fn second(&self) -> &B {
        &self.second
    }

    /// Consume and return both reporters.
    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: UpdateReporter, B: UpdateReporter> UpdateReporter for CompositeReporter<A, B> {
    fn on_remove_top(&mut self, removed: usize, orphans: usize, freed: &FactorGraph) {
        self.first.on_remove_top(removed, orphans, freed);
        self.second.on_remove_top(removed, orphans, freed);
    }

    fn on_ordering(&mut self, ordering: &Ordering) {
        self.first.on_ordering(ordering);
        self.second.on_ordering(ordering);
    }

    fn on_eliminated(&mut self, net: &BayesNet) {
        self.first.on_eliminated(net);
        self.second.on_eliminated(net);
    }

    fn on_update_complete(&mut self, result: &UpdateResult) {
        self.first.on_update_complete(result);
        self.second.on_update_complete(result);
    }

    fn on_update_failed(&mut self, error: &InferenceError) {
        self.first.on_update_failed(error);
        self.second.on_update_failed(error);
    }
}

// ============================================================================
// Tests
// ============================================================================
