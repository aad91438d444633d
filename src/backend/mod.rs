//! Tensor backends.
//!
//! The deferred machinery never touches numbers itself. Every operation node
//! is executed through a [`Backend`], which sees concrete tensors only.

mod cpu;

pub use cpu::CpuBackend;

use core::fmt;

use smallvec::SmallVec;

use crate::error::BackendResult;
use crate::notation::Labels;
use crate::pattern::TensordotAxes;

/// Labels of one einsum step: one subscript per operand and the output.
///
/// Labels never contain an ellipsis; the driver expands it before building
/// steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquationFragment {
    pub inputs: SmallVec<[Labels; 2]>,
    pub output: Labels,
}

impl EquationFragment {
    pub fn new(inputs: impl IntoIterator<Item = Labels>, output: Labels) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
            output,
        }
    }

    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Input labels absent from the output, sorted and deduplicated.
    pub fn reduced_labels(&self) -> Labels {
        let mut reduced: Labels = self
            .inputs
            .iter()
            .flatten()
            .copied()
            .filter(|c| !self.output.contains(c))
            .collect();
        reduced.sort_unstable();
        reduced.dedup();
        reduced
    }

    /// Renames every label to [`get_symbol`](crate::notation::get_symbol)
    /// numbers in order of first appearance, inputs first.
    ///
    /// Two fragments that differ only by label names canonicalize to the same
    /// value. Returns the renamed fragment and the `(old, new)` mapping.
    pub fn canonicalize(&self) -> (EquationFragment, SmallVec<[(char, char); 8]>) {
        let mut mapping: SmallVec<[(char, char); 8]> = SmallVec::new();
        let mut rename = |c: char| -> char {
            if let Some(&(_, new)) = mapping.iter().find(|(old, _)| *old == c) {
                return new;
            }
            let new = crate::notation::get_symbol(mapping.len());
            mapping.push((c, new));
            new
        };

        let inputs: SmallVec<[Labels; 2]> = self
            .inputs
            .iter()
            .map(|labels| labels.iter().map(|&c| rename(c)).collect())
            .collect();
        let output: Labels = self.output.iter().map(|&c| rename(c)).collect();

        (EquationFragment { inputs, output }, mapping)
    }
}

impl fmt::Display for EquationFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, labels) in self.inputs.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            for c in labels {
                write!(f, "{c}")?;
            }
        }
        write!(f, "->")?;
        for c in &self.output {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Numeric executor for deferred nodes.
///
/// Implementations receive fully evaluated operands and must not retain
/// them beyond the call.
pub trait Backend {
    type Tensor;

    /// Shape of a tensor.
    fn shape(&self, tensor: &Self::Tensor) -> Vec<usize>;

    /// Elementwise product of `operands` broadcast over `equation.inputs`,
    /// summed down to `equation.output`.
    ///
    /// Must report a label bound to two sizes and an operand whose rank
    /// differs from its subscript.
    fn einsum(
        &self,
        equation: &EquationFragment,
        operands: &[&Self::Tensor],
    ) -> BackendResult<Self::Tensor>;

    /// Contracts `lhs` and `rhs` over the matched axes. The result holds the
    /// free axes of `lhs` followed by the free axes of `rhs`, in order.
    fn tensordot(
        &self,
        lhs: &Self::Tensor,
        rhs: &Self::Tensor,
        axes: &TensordotAxes,
    ) -> BackendResult<Self::Tensor>;
}
