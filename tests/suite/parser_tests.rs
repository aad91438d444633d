//! Parser tests for einsum notation.

use deferred_einsum::notation::{get_symbol, parse_einsum, validate_notation, validate_ranks, EllipsisDims};
use deferred_einsum::EquationError;
use pretty_assertions::assert_eq;

#[test]
fn test_parse_basic_matmul() {
    let notation = parse_einsum("ij,jk->ik").unwrap();
    assert_eq!(notation.num_inputs(), 2);
    assert!(!notation.has_ellipsis());
    assert!(notation.contraction_indices().contains(&'j'));
}

#[test]
fn test_parse_transpose() {
    let notation = parse_einsum("ij->ji").unwrap();
    assert_eq!(notation.num_inputs(), 1);
    assert!(notation.contraction_indices().is_empty());
    assert_eq!(notation.output_indices(), &['j', 'i']);
}

#[test]
fn test_parse_trace() {
    let notation = parse_einsum("ii->").unwrap();
    assert_eq!(notation.num_inputs(), 1);
    assert!(notation.output_indices().is_empty());
}

#[test]
fn test_parse_ellipsis() {
    let notation = parse_einsum("...ij,...jk->...ik").unwrap();
    assert!(notation.has_ellipsis());
    validate_notation(&notation).unwrap();
    assert_eq!(validate_ranks(&notation, &[&[5, 2, 3], &[5, 3, 4]]), Ok(EllipsisDims::uniform(2, 1)));
    assert_eq!(validate_ranks(&notation, &[&[5, 2, 3], &[3, 4]]).unwrap().per_input, vec![1, 0]);
}

#[test]
fn test_parse_implicit_output() {
    let notation = parse_einsum("ij,jk").unwrap();
    assert_eq!(notation.output().to_string(), "ik");
}

#[test]
fn test_parse_extended_alphabet() {
    let wide: String = (0..60).map(get_symbol).collect();
    let equation = format!("{wide}->{}", &wide[..wide.char_indices().nth(55).unwrap().0]);

    let notation = parse_einsum(&equation).unwrap();

    assert_eq!(notation.inputs()[0].len(), 60);
    assert_eq!(notation.output_indices().len(), 55);
    assert_eq!(notation.contraction_indices().len(), 5);
}

#[test]
fn test_get_symbol_is_injective() {
    let symbols: Vec<char> = (0..300).map(get_symbol).collect();
    for (i, c) in symbols.iter().enumerate() {
        assert!(c.is_alphabetic());
        assert!(!symbols[..i].contains(c));
    }
}

#[test]
fn test_output_index_must_appear_in_inputs() {
    let notation = parse_einsum("ij,jk->iz").unwrap();
    assert_eq!(
        validate_notation(&notation),
        Err(EquationError::OutputIndexNotInInputs { index: 'z' })
    );
}

#[test]
fn test_duplicate_output_index() {
    let notation = parse_einsum("ij->ii").unwrap();
    assert_eq!(
        validate_notation(&notation),
        Err(EquationError::DuplicateOutputIndex { index: 'i' })
    );
}

#[test]
fn test_rank_mismatch_is_equation_error() {
    let notation = parse_einsum("ij,jk->ik").unwrap();
    let err = validate_ranks(&notation, &[&[2, 3, 4], &[3, 4]]).unwrap_err();
    assert!(matches!(err, EquationError::DimensionMismatch { expected: 2, got: 3, .. }));
}

#[test]
fn test_operand_count() {
    let notation = parse_einsum("ij,jk->ik").unwrap();
    assert_eq!(
        validate_ranks(&notation, &[&[2, 3]]),
        Err(EquationError::OperandCount { expected: 2, got: 1 })
    );
}

#[test]
fn test_parse_errors() {
    assert!(matches!(parse_einsum(""), Err(EquationError::ParseError { .. })));
    assert!(matches!(parse_einsum("i1,jk->ik"), Err(EquationError::ParseError { .. })));
}
