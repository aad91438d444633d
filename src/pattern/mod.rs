//! Pattern recognition for pairwise steps.
//!
//! Decides, once per node at construction time, which backend primitive
//! evaluates a step:
//! - Tensordot: pure pairwise contraction over matched axes
//! - Einsum: everything else (batch labels, diagonals, one-sided sums,
//!   permuted outputs, unary reductions)

mod tensordot;

pub use tensordot::{tensordot_axes, TensordotAxes};

/// Backend primitive chosen for a step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StepPattern {
    Tensordot(TensordotAxes),
    Einsum,
}

/// Classifies the step `inputs->output`.
pub fn recognize_step(inputs: &[&[char]], output: &[char]) -> StepPattern {
    match inputs {
        [lhs, rhs] => match tensordot_axes(lhs, rhs, output) {
            Some(axes) => StepPattern::Tensordot(axes),
            None => StepPattern::Einsum,
        },
        _ => StepPattern::Einsum,
    }
}
