//! Configuration types for elimination and incremental updates

use serde::{Deserialize, Serialize};

use crate::common::constants::DEFAULT_RANK_TOLERANCE;

/// How discrete frontal variables are removed from a joint table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EliminationMode {
    /// Sum-product: marginal posteriors
    #[default]
    Sum,
    /// Max-product: most probable explanation
    Max,
}

/// How an ordering is chosen when the caller does not supply one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderingPolicy {
    /// Continuous keys sorted, then discrete keys sorted
    Natural,
    /// Greedy minimum degree, discrete keys last
    #[default]
    MinDegree,
}

/// Parameters of one elimination pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EliminationConfig {
    /// Discrete elimination mode
    pub mode: EliminationMode,
    /// Smallest whitened column precision accepted as a soft pivot
    pub rank_tolerance: f64,
}

impl EliminationConfig {
    /// Sum-product elimination with the default rank tolerance
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the discrete elimination mode
    pub fn with_mode(mut self, mode: EliminationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the rank tolerance
    pub fn with_rank_tolerance(mut self, rank_tolerance: f64) -> Self {
        self.rank_tolerance = rank_tolerance;
        self
    }
}

impl Default for EliminationConfig {
    fn default() -> Self {
        Self {
            mode: EliminationMode::Sum,
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
        }
    }
}

/// Configuration of the incremental updater
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsamConfig {
    /// Ordering used to re-eliminate the top of the tree
    pub ordering: OrderingPolicy,
    /// Elimination parameters
    pub elimination: EliminationConfig,
    /// Verify tree invariants after every update
    pub check_invariants: bool,
}

impl IsamConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ordering policy
    pub fn with_ordering(mut self, ordering: OrderingPolicy) -> Self {
        self.ordering = ordering;
        self
    }

    /// Set the elimination parameters
    pub fn with_elimination(mut self, elimination: EliminationConfig) -> Self {
        self.elimination = elimination;
        self
    }

    /// Enable or disable invariant checks after each update
    pub fn with_check_invariants(mut self, check: bool) -> Self {
        self.check_invariants = check;
        self
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Serialize to pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for IsamConfig {
    fn default() -> Self {
        Self {
            ordering: OrderingPolicy::MinDegree,
            elimination: EliminationConfig::default(),
            check_invariants: cfg!(debug_assertions),
        }
    }
}
