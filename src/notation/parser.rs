//! Einsum notation parser.
//!
//! Parses strings like "ij,jk->ik" into structured EinsumNotation.

use hashbrown::HashMap;

use super::notation::EinsumNotation;
use super::subscript::Subscript;
use crate::error::{EquationError, EquationResult};

/// Number of ASCII letters available before [`get_symbol`] moves into the
/// extended alphabet.
const ASCII_SYMBOLS: usize = 52;

/// Offset added to the symbol number once ASCII letters run out.
const EXTENDED_SYMBOL_OFFSET: u32 = 140;

/// Returns the `i`-th label of the extended einsum alphabet.
///
/// `0..26` map to `a-z`, `26..52` to `A-Z`, later numbers to alphabetic
/// Unicode code points starting at `i + 140`. Code points that are not
/// alphabetic are skipped so every returned symbol parses as a label.
pub fn get_symbol(i: usize) -> char {
    const LETTERS: &[u8; ASCII_SYMBOLS] =
        b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if i < ASCII_SYMBOLS {
        return LETTERS[i] as char;
    }
    let mut remaining = i - ASCII_SYMBOLS;
    let mut code = EXTENDED_SYMBOL_OFFSET + ASCII_SYMBOLS as u32;
    loop {
        if let Some(c) = char::from_u32(code).filter(|c| c.is_alphabetic() && !c.is_ascii()) {
            if remaining == 0 {
                return c;
            }
            remaining -= 1;
        }
        code += 1;
    }
}

/// Parses an einsum notation string.
///
/// # Grammar
///
/// ```text
/// einsum      ::= inputs '->' output | inputs
/// inputs      ::= subscript (',' subscript)*
/// output      ::= subscript
/// subscript   ::= index* | '...' index* | index* '...' | index* '...' index*
/// index       ::= any alphabetic character
/// ```
pub fn parse_einsum(notation: &str) -> EquationResult<EinsumNotation> {
    let notation = notation.trim();

    if notation.is_empty() {
        return Err(EquationError::parse("empty notation"));
    }

    let (inputs_str, output_str) = match notation.split_once("->") {
        Some((inputs, output)) => (inputs, Some(output)),
        None => (notation, None),
    };

    if inputs_str.trim().is_empty() && !inputs_str.contains(',') {
        return Err(EquationError::NoInputs);
    }

    let inputs = inputs_str
        .split(',')
        .map(|s| parse_subscript(s.trim()))
        .collect::<EquationResult<Vec<_>>>()?;

    let output = match output_str {
        Some(out_str) => parse_subscript(out_str.trim())?,
        None => infer_output(&inputs),
    };

    Ok(EinsumNotation::new(inputs, output).with_original(notation))
}

/// Parses a single subscript string into a Subscript.
fn parse_subscript(s: &str) -> EquationResult<Subscript> {
    let mut subscript = Subscript::new();
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if chars.next() != Some('.') || chars.next() != Some('.') {
                    return Err(EquationError::parse("incomplete ellipsis, expected '...'"));
                }
                if subscript.has_ellipsis() {
                    return Err(EquationError::parse("multiple ellipses in subscript"));
                }
                subscript.push_ellipsis();
            }
            ' ' | '\t' => continue,
            c if c.is_alphabetic() => subscript.push_named(c),
            _ => {
                return Err(EquationError::parse(format!(
                    "invalid character '{}' in subscript",
                    c
                )));
            }
        }
    }

    Ok(subscript)
}

/// Infers the output subscript when not explicitly provided.
///
/// Indices appearing exactly once across all inputs form the output, sorted.
/// If any input has an ellipsis, the output starts with one.
fn infer_output(inputs: &[Subscript]) -> Subscript {
    let mut counts: HashMap<char, usize> = HashMap::new();
    for c in inputs.iter().flat_map(|input| input.named_indices()) {
        *counts.entry(c).or_insert(0) += 1;
    }

    let mut output_indices: Vec<char> = counts
        .into_iter()
        .filter(|&(_, count)| count == 1)
        .map(|(c, _)| c)
        .collect();
    output_indices.sort_unstable();

    let mut output = Subscript::new();
    if inputs.iter().any(Subscript::has_ellipsis) {
        output.push_ellipsis();
    }
    output_indices.into_iter().for_each(|c| output.push_named(c));
    output
}
