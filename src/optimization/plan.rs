//! Strategy selection and the path optimizer seam.

use super::cost::CostModel;
use super::dynamic::{optimal_path, MAX_DP_TENSORS};
use super::greedy::greedy_path;
use super::path::ContractionPath;
use crate::notation::EinsumNotation;

/// Inputs up to this count use the optimal search under [`ContractionStrategy::Auto`].
const AUTO_OPTIMAL_TENSORS: usize = 4;

/// Produces the ordered pairwise steps for a contraction.
///
/// The deferred driver executes whatever steps an optimizer emits, in order,
/// without re-deriving them. Implementations must be deterministic: equal
/// inputs have to yield equal paths, or repeated contractions stop sharing
/// intermediates.
pub trait PathOptimizer {
    /// Computes a path for `notation` (already free of ellipsis) over
    /// operands of the given shapes.
    fn optimize(&self, notation: &EinsumNotation, shapes: &[&[usize]]) -> ContractionPath;
}

/// Strategy for finding contraction paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContractionStrategy {
    /// Greedy algorithm - fast O(n³) heuristic.
    Greedy,
    /// Optimal dynamic programming - exponential but optimal for small n.
    Optimal,
    /// Optimal for a handful of inputs, greedy beyond.
    #[default]
    Auto,
}

impl ContractionStrategy {
    /// Finds a path with this strategy under `cost_model`.
    pub fn path(
        self,
        notation: &EinsumNotation,
        shapes: &[&[usize]],
        cost_model: &CostModel,
    ) -> ContractionPath {
        let n = notation.num_inputs();
        match self {
            Self::Greedy => greedy_path(notation, shapes, cost_model),
            Self::Optimal if n <= MAX_DP_TENSORS => optimal_path(notation, shapes, cost_model),
            Self::Optimal => greedy_path(notation, shapes, cost_model),
            Self::Auto if n <= AUTO_OPTIMAL_TENSORS => optimal_path(notation, shapes, cost_model),
            Self::Auto => greedy_path(notation, shapes, cost_model),
        }
    }
}

impl PathOptimizer for ContractionStrategy {
    fn optimize(&self, notation: &EinsumNotation, shapes: &[&[usize]]) -> ContractionPath {
        self.path(notation, shapes, &CostModel::default())
    }
}

impl PathOptimizer for (ContractionStrategy, CostModel) {
    fn optimize(&self, notation: &EinsumNotation, shapes: &[&[usize]]) -> ContractionPath {
        self.0.path(notation, shapes, &self.1)
    }
}
