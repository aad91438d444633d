//! Complete einsum notation representation.

use std::collections::BTreeSet;
use core::fmt;

use super::subscript::{Labels, Subscript};
use super::validation::EllipsisDims;

/// First code point used for labels generated from an ellipsis (circled
/// digits). These are not alphabetic, so they can never clash with a label
/// written by the caller.
const BATCH_LABEL_BASE: u32 = 0x2460;

/// Complete parsed einsum notation.
///
/// Contains the input subscripts, output subscript, and derived index information.
#[derive(Debug, Clone)]
pub struct EinsumNotation {
    inputs: Vec<Subscript>,
    output: Subscript,
    /// Indices that appear in inputs but not output (summed).
    contraction_indices: BTreeSet<char>,
    /// Output indices in order.
    output_indices: Labels,
    has_ellipsis: bool,
    original: Option<String>,
}

impl EinsumNotation {
    pub fn new(inputs: Vec<Subscript>, output: Subscript) -> Self {
        let has_ellipsis = inputs.iter().any(Subscript::has_ellipsis) || output.has_ellipsis();

        let output_indices = output.labels();
        let contraction_indices = inputs
            .iter()
            .flat_map(|input| input.named_indices())
            .filter(|c| !output_indices.contains(c))
            .collect();

        Self {
            inputs,
            output,
            contraction_indices,
            output_indices,
            has_ellipsis,
            original: None,
        }
    }

    /// Sets the original notation string.
    pub fn with_original(mut self, original: impl Into<String>) -> Self {
        self.original = Some(original.into());
        self
    }

    #[inline]
    pub fn inputs(&self) -> &[Subscript] {
        &self.inputs
    }

    #[inline]
    pub fn output(&self) -> &Subscript {
        &self.output
    }

    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Returns the original string this notation was parsed from, if any.
    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    /// Returns the indices that will be summed over.
    #[inline]
    pub fn contraction_indices(&self) -> &BTreeSet<char> {
        &self.contraction_indices
    }

    #[inline]
    pub fn output_indices(&self) -> &[char] {
        &self.output_indices
    }

    /// Returns the labels of each input (ellipsis omitted).
    pub fn input_labels(&self) -> Vec<Labels> {
        self.inputs.iter().map(Subscript::labels).collect()
    }

    #[inline]
    pub fn has_ellipsis(&self) -> bool {
        self.has_ellipsis
    }

    /// Replaces every ellipsis with generated labels.
    ///
    /// The output ellipsis gets `dims.broadcast` labels. Each input takes the
    /// trailing labels of those, as many as its own ellipsis covers, so
    /// ellipsis dimensions line up from the right. The returned notation has
    /// no ellipsis and the same original string.
    pub fn expand_ellipsis(&self, dims: &EllipsisDims) -> EinsumNotation {
        if !self.has_ellipsis {
            return self.clone();
        }
        let batch = batch_labels(dims.broadcast);
        let inputs = self
            .inputs
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let width = dims.per_input.get(i).copied().unwrap_or(0).min(batch.len());
                s.expand_ellipsis(&batch[batch.len() - width..])
            })
            .collect();
        let output = self.output.expand_ellipsis(&batch);
        let expanded = EinsumNotation::new(inputs, output);
        match &self.original {
            Some(original) => expanded.with_original(original.clone()),
            None => expanded,
        }
    }
}

/// Generates the labels that stand in for `count` ellipsis dimensions.
pub(crate) fn batch_labels(count: usize) -> Labels {
    (0..count)
        .filter_map(|i| char::from_u32(BATCH_LABEL_BASE + i as u32))
        .collect()
}

impl fmt::Display for EinsumNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, input) in self.inputs.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", input)?;
        }
        write!(f, "->{}", self.output)
    }
}
