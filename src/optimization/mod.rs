//! Contraction path optimization for einsum.
//!
//! The deferred layer only needs *some* ordered list of pairwise steps; these
//! optimizers are the bundled collaborators that produce it:
//! - Greedy: O(n³) fast heuristic
//! - Dynamic Programming: optimal for small n

mod cost;
mod dynamic;
mod greedy;
mod path;
mod plan;

pub use cost::{ContractionCost, CostModel};
pub use dynamic::{optimal_path, MAX_DP_TENSORS};
pub use greedy::greedy_path;
pub use path::{ContractionPath, ContractionStep, TensorState};
pub use plan::{ContractionStrategy, PathOptimizer};
