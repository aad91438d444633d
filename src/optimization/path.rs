//! Contraction path representation.

use hashbrown::HashMap;
use smallvec::{smallvec, SmallVec};

use crate::notation::Labels;

/// A single step in a contraction path.
///
/// Operand positions refer to the current working list: the step removes its
/// operands from the list and appends its result at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContractionStep {
    /// Positions of the one or two operands in the current list.
    pub operands: SmallVec<[usize; 2]>,
    /// Indices summed out in this step.
    pub contracted_indices: Labels,
    /// Indices of the result tensor, in order.
    pub result_indices: Labels,
    /// Estimated cost of this step.
    pub estimated_flops: u64,
}

impl ContractionStep {
    /// A step combining the operands at positions `i` and `j`.
    pub fn pair(
        (i, j): (usize, usize),
        contracted_indices: Labels,
        result_indices: Labels,
        estimated_flops: u64,
    ) -> Self {
        Self {
            operands: smallvec![i, j],
            contracted_indices,
            result_indices,
            estimated_flops,
        }
    }

    /// A step reducing or permuting the single operand at position `i`.
    pub fn unary(
        i: usize,
        contracted_indices: Labels,
        result_indices: Labels,
        estimated_flops: u64,
    ) -> Self {
        Self {
            operands: smallvec![i],
            contracted_indices,
            result_indices,
            estimated_flops,
        }
    }

    /// Returns the operand positions sorted in descending order, the order in
    /// which they must be removed from the working list.
    pub fn removal_order(&self) -> SmallVec<[usize; 2]> {
        let mut positions = self.operands.clone();
        positions.sort_unstable_by(|a, b| b.cmp(a));
        positions
    }
}

/// A complete contraction path.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContractionPath {
    steps: Vec<ContractionStep>,
    total_flops: u64,
}

impl ContractionPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            steps: Vec::with_capacity(capacity),
            total_flops: 0,
        }
    }

    pub fn push(&mut self, step: ContractionStep) {
        self.total_flops = self.total_flops.saturating_add(step.estimated_flops);
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[ContractionStep] {
        &self.steps
    }

    pub fn total_flops(&self) -> u64 {
        self.total_flops
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl FromIterator<ContractionStep> for ContractionPath {
    fn from_iter<I: IntoIterator<Item = ContractionStep>>(iter: I) -> Self {
        let mut path = ContractionPath::new();
        iter.into_iter().for_each(|step| path.push(step));
        path
    }
}

/// Working list of tensors during path search.
#[derive(Debug, Clone)]
pub struct TensorState {
    pub shapes: Vec<Vec<usize>>,
    pub indices: Vec<Labels>,
}

impl TensorState {
    pub fn new(shapes: Vec<Vec<usize>>, indices: Vec<Labels>) -> Self {
        Self { shapes, indices }
    }

    /// Number of tensors remaining.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Size of every label known to the current tensors.
    ///
    /// A label broadcast from size 1 takes its larger size. Other conflicts
    /// are left for the backend to report.
    pub fn dim_map(&self) -> HashMap<char, usize> {
        let mut dims: HashMap<char, usize> = HashMap::new();
        for (labels, shape) in self.indices.iter().zip(&self.shapes) {
            for (&c, &d) in labels.iter().zip(shape) {
                dims.entry(c).and_modify(|e| *e = (*e).max(d)).or_insert(d);
            }
        }
        dims
    }

    /// Applies one step, returning the new state.
    pub fn apply(&self, step: &ContractionStep) -> TensorState {
        let dims = self.dim_map();
        let mut next = self.clone();
        for position in step.removal_order() {
            next.shapes.remove(position);
            next.indices.remove(position);
        }
        next.shapes.push(
            step.result_indices
                .iter()
                .map(|c| dims.get(c).copied().unwrap_or(1))
                .collect(),
        );
        next.indices.push(step.result_indices.clone());
        next
    }
}
