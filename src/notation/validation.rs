//! Validation for einsum notation and tensor shapes.

use super::notation::EinsumNotation;
use crate::error::{EquationError, EquationResult};

/// Validates an einsum notation for correctness.
///
/// Checks:
/// - Output indices must appear in at least one input
/// - Output indices must be unique
/// - Ellipsis usage is consistent
pub fn validate_notation(notation: &EinsumNotation) -> EquationResult<()> {
    validate_output_indices(notation)?;
    validate_ellipsis_consistency(notation)?;
    Ok(())
}

fn validate_output_indices(notation: &EinsumNotation) -> EquationResult<()> {
    let output = notation.output_indices();
    for (pos, &c) in output.iter().enumerate() {
        if !notation.inputs().iter().any(|input| input.contains(c)) {
            return Err(EquationError::OutputIndexNotInInputs { index: c });
        }
        if output[..pos].contains(&c) {
            return Err(EquationError::DuplicateOutputIndex { index: c });
        }
    }
    Ok(())
}

fn validate_ellipsis_consistency(notation: &EinsumNotation) -> EquationResult<()> {
    let any_input = notation.inputs().iter().any(|s| s.has_ellipsis());
    let output = notation.output().has_ellipsis();

    match (any_input, output) {
        (true, false) => Err(EquationError::InconsistentEllipsis {
            message: "output must have ellipsis when inputs do".to_string(),
        }),
        (false, true) => Err(EquationError::InconsistentEllipsis {
            message: "output has ellipsis but no input does".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Dimensions standing behind each `...` of a notation.
///
/// Ellipses are right-aligned: an input with fewer ellipsis dimensions than
/// the widest one broadcasts over the leading ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EllipsisDims {
    /// Dimensions of the output ellipsis, the widest of the inputs.
    pub broadcast: usize,
    /// Dimensions of each input's ellipsis, 0 where there is none.
    pub per_input: Vec<usize>,
}

impl EllipsisDims {
    /// No ellipsis anywhere.
    pub fn none(num_inputs: usize) -> Self {
        Self {
            broadcast: 0,
            per_input: vec![0; num_inputs],
        }
    }

    /// The same number of ellipsis dimensions for every input.
    pub fn uniform(num_inputs: usize, dims: usize) -> Self {
        Self {
            broadcast: dims,
            per_input: vec![dims; num_inputs],
        }
    }
}

/// Checks operand count and ranks against the notation.
///
/// Dimension sizes are not compared here; a label bound to two different
/// sizes is a backend failure found at evaluation time.
pub fn validate_ranks(notation: &EinsumNotation, shapes: &[&[usize]]) -> EquationResult<EllipsisDims> {
    if shapes.len() != notation.num_inputs() {
        return Err(EquationError::OperandCount {
            expected: notation.num_inputs(),
            got: shapes.len(),
        });
    }

    let mut dims = EllipsisDims::none(shapes.len());
    for ((input, shape), per_input) in notation.inputs().iter().zip(shapes).zip(&mut dims.per_input) {
        let explicit = input.explicit_count();
        let rank = shape.len();

        let fits = if input.has_ellipsis() {
            rank >= explicit
        } else {
            rank == explicit
        };
        if !fits {
            return Err(EquationError::DimensionMismatch {
                subscript: input.to_string(),
                expected: explicit,
                got: rank,
            });
        }
        if input.has_ellipsis() {
            *per_input = rank - explicit;
        }
    }
    dims.broadcast = dims.per_input.iter().copied().max().unwrap_or(0);

    Ok(dims)
}
