//! Configuration for deferred einsum contexts.

use crate::optimization::{ContractionStrategy, CostModel};

/// Configuration options for a [`SharingContext`](super::SharingContext).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EinsumConfig {
    /// Strategy for finding contraction paths.
    pub strategy: ContractionStrategy,
    /// Cost model the strategy minimizes.
    pub cost_model: CostModel,
    /// Whether [`enter_scope`](super::SharingContext::enter_scope) inside an
    /// active scope reuses the parent's cache instead of starting a fresh one.
    pub share_nested_scopes: bool,
    /// Whether [`enter_scope`](super::SharingContext::enter_scope) records
    /// per-scope statistics and traces node activity.
    pub debug: bool,
}

impl Default for EinsumConfig {
    fn default() -> Self {
        Self {
            strategy: ContractionStrategy::Auto,
            cost_model: CostModel::default(),
            share_nested_scopes: false,
            debug: false,
        }
    }
}

impl EinsumConfig {
    /// Creates a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the contraction strategy.
    pub fn with_strategy(mut self, strategy: ContractionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the cost model.
    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    /// Makes nested scopes share the parent's cache by default.
    pub fn with_shared_nested_scopes(mut self, enabled: bool) -> Self {
        self.share_nested_scopes = enabled;
        self
    }

    /// Enables or disables debug statistics by default.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Greedy paths under a FLOP-only cost, for large equations.
    pub fn fast() -> Self {
        Self {
            strategy: ContractionStrategy::Greedy,
            cost_model: CostModel::flops_only(),
            ..Self::default()
        }
    }

    /// Optimal paths with statistics on, for inspecting sharing.
    pub fn inspect() -> Self {
        Self {
            strategy: ContractionStrategy::Optimal,
            debug: true,
            ..Self::default()
        }
    }
}
