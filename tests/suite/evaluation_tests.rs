//! Numeric results and error timing.

use std::rc::Rc;

use deferred_einsum::{
    BackendError, ContractionStrategy, EinsumConfig, EinsumError, EquationError, Execution,
};
use ndarray::{ArrayD, Axis};

use crate::common::{assert_close, context, context_with, tensor};

fn check(equation: &str, shapes: &[&[usize]]) {
    for strategy in [ContractionStrategy::Greedy, ContractionStrategy::Optimal] {
        let ctx = context_with(EinsumConfig::new().with_strategy(strategy));
        let _scope = ctx.enter_scope();
        let tensors: Vec<Rc<ArrayD<f64>>> =
            shapes.iter().enumerate().map(|(i, s)| tensor(s, i as u64)).collect();
        let handles: Vec<_> = tensors.iter().map(|t| ctx.wrap_as_deferred(t)).collect();
        let refs: Vec<_> = handles.iter().collect();

        let result = ctx.contract(equation, &refs, Execution::Deferred).unwrap();
        let actual = result.evaluate().unwrap();

        let direct: Vec<&ArrayD<f64>> = tensors.iter().map(|t| t.as_ref()).collect();
        let expected = ctx.backend().einsum_direct(equation, &direct).unwrap();
        assert_close(&actual, &expected);
        assert_eq!(result.shape(), expected.shape().to_vec());
    }
}

#[test]
fn test_four_operand_network() {
    check("abc,bcd,cde,def->af", &[&[2, 3, 4], &[3, 4, 5], &[4, 5, 6], &[5, 6, 7]]);
}

#[test]
fn test_matrix_chain() {
    check("ij,jk,kl,lm->im", &[&[3, 4], &[4, 5], &[5, 2], &[2, 6]]);
}

#[test]
fn test_scalar_output() {
    check("ab,bc,cd->", &[&[5, 4], &[4, 3], &[3, 2]]);
}

#[test]
fn test_batch_labels() {
    check("bij,bjk,bkl->bil", &[&[2, 3, 4], &[2, 4, 5], &[2, 5, 3]]);
}

#[test]
fn test_outer_product_and_permutation() {
    check("i,j,k->kji", &[&[2], &[3], &[4]]);
}

#[test]
fn test_outer_product_steps_inside_a_network() {
    check("ab,a,b,ab->", &[&[2, 3], &[2], &[3], &[2, 3]]);
    check("a,b,c,abc->abc", &[&[2], &[3], &[4], &[2, 3, 4]]);
}

#[test]
fn test_single_operand_reductions() {
    check("ii->", &[&[4, 4]]);
    check("iij->j", &[&[3, 3, 2]]);
    check("ijk->kij", &[&[2, 3, 4]]);
}

#[test]
fn test_repeated_labels_across_operands() {
    check("ij,jk,ki->", &[&[2, 3], &[3, 4], &[4, 2]]);
    check("ab,ab,ab->a", &[&[3, 2], &[3, 2], &[3, 2]]);
}

#[test]
fn test_implicit_output_and_ellipsis() {
    check("ab,bc,cd", &[&[2, 3], &[3, 4], &[4, 5]]);
    check("...ij,...jk->...ik", &[&[2, 2, 3], &[2, 3, 4]]);
    check("a...,a...->...", &[&[3, 2, 2], &[3, 2, 2]]);
}

#[test]
fn test_ellipsis_of_different_widths() {
    let ctx = context();
    let _scope = ctx.enter_scope();
    let x = tensor(&[2, 3, 4], 1);
    let y = tensor(&[4, 5], 2);
    let (dx, dy) = (ctx.wrap_as_deferred(&x), ctx.wrap_as_deferred(&y));

    let result = ctx.contract("...ij,...jk->...ik", &[&dx, &dy], Execution::Deferred).unwrap();

    let expected = ctx.backend().einsum_direct("bij,jk->bik", &[&*x, &*y]).unwrap();
    assert_eq!(result.shape(), vec![2, 3, 5]);
    assert_close(&result.evaluate().unwrap(), &expected);
}

#[test]
fn test_ellipsis_broadcasts_unit_dims() {
    let ctx = context();
    let _scope = ctx.enter_scope();
    let x = tensor(&[1, 3, 4], 1);
    let y = tensor(&[2, 4, 5], 2);
    let (dx, dy) = (ctx.wrap_as_deferred(&x), ctx.wrap_as_deferred(&y));

    let result = ctx.contract("...ij,...jk->...ik", &[&dx, &dy], Execution::Deferred).unwrap();

    let single = x.index_axis(Axis(0), 0).to_owned();
    let expected = ctx.backend().einsum_direct("ij,bjk->bik", &[&single, &*y]).unwrap();
    assert_eq!(result.shape(), vec![2, 3, 5]);
    assert_close(&result.evaluate().unwrap(), &expected);
}

#[test]
fn test_ellipsis_broadcast_across_a_network() {
    check("...ij,jk,...k->...i", &[&[3, 1, 2, 4], &[4, 5], &[2, 5]]);
    check("...a,...a->...", &[&[2, 1, 3], &[4, 3]]);
}

#[test]
fn test_shared_operand_used_twice() {
    let ctx = context();
    let _scope = ctx.enter_scope();
    let x = tensor(&[3, 3], 1);
    let dx = ctx.wrap_as_deferred(&x);

    let result = ctx.contract("ij,jk,kl->il", &[&dx, &dx, &dx], Execution::Deferred).unwrap();

    let expected = ctx.backend().einsum_direct("ij,jk,kl->il", &[&*x, &*x, &*x]).unwrap();
    assert_close(&result.evaluate().unwrap(), &expected);
}

#[test]
fn test_nothing_runs_until_evaluate() {
    let ctx = context();
    let scope = ctx.enter_scope();
    let x = ctx.wrap_as_deferred(&tensor(&[3, 4], 1));
    let y = ctx.wrap_as_deferred(&tensor(&[4, 5], 2));
    let z = ctx.wrap_as_deferred(&tensor(&[5, 2], 3));

    let result = ctx.contract("ab,bc,cd->ad", &[&x, &y, &z], Execution::Deferred).unwrap();
    assert_eq!(scope.cache().num_evaluated(), 0);
    assert!(!result.is_evaluated());

    result.evaluate().unwrap();
    result.evaluate().unwrap();

    assert_eq!(scope.cache().stats().executed, 2);
    assert_eq!(scope.cache().num_evaluated(), 2);
}

#[test]
fn test_results_survive_their_scope() {
    let ctx = context();
    let result = {
        let _scope = ctx.enter_scope();
        let x = ctx.wrap_as_deferred(&tensor(&[2, 3], 1));
        let y = ctx.wrap_as_deferred(&tensor(&[3, 2], 2));
        ctx.contract("ij,jk->ik", &[&x, &y], Execution::Deferred).unwrap()
    };

    assert_eq!(ctx.depth(), 0);
    assert_eq!(result.evaluate().unwrap().shape(), &[2, 2]);
}

#[test]
fn test_equation_errors_raised_at_contract() {
    let ctx = context();
    let _scope = ctx.enter_scope();
    let x = ctx.wrap_as_deferred(&tensor(&[2, 3], 1));
    let y = ctx.wrap_as_deferred(&tensor(&[3, 4], 2));

    let cases: [(&str, Vec<_>, EquationError); 4] = [
        ("ij,jk->iz", vec![&x, &y], EquationError::OutputIndexNotInInputs { index: 'z' }),
        ("ij,jk->ii", vec![&x, &y], EquationError::DuplicateOutputIndex { index: 'i' }),
        ("ij,jk,kl->il", vec![&x, &y], EquationError::OperandCount { expected: 3, got: 2 }),
        (
            "ijk,jk->i",
            vec![&x, &y],
            EquationError::DimensionMismatch { subscript: "ijk".to_string(), expected: 3, got: 2 },
        ),
    ];

    for (equation, operands, expected) in cases {
        let err = ctx.contract(equation, &operands, Execution::Deferred).unwrap_err();
        assert!(err.is_equation_error(), "{equation}");
        assert_eq!(err, EinsumError::from(expected), "{equation}");
    }
}

#[test]
fn test_size_conflict_raised_at_evaluate() {
    let ctx = context();
    let _scope = ctx.enter_scope();
    let x = ctx.wrap_as_deferred(&tensor(&[2, 3], 1));
    let y = ctx.wrap_as_deferred(&tensor(&[4, 5], 2));

    let product = ctx.contract("ij,jk->ik", &[&x, &y], Execution::Deferred).unwrap();
    let err = product.evaluate().unwrap_err();

    assert!(err.is_backend_error());
    assert!(!product.is_evaluated());
}

#[test]
fn test_size_conflict_in_einsum_step() {
    let ctx = context();
    let _scope = ctx.enter_scope();
    let x = ctx.wrap_as_deferred(&tensor(&[2, 3], 1));
    let y = ctx.wrap_as_deferred(&tensor(&[2, 4], 2));

    let product = ctx.contract("ij,ij->ij", &[&x, &y], Execution::Deferred).unwrap();

    // Node equations use canonical labels, so only the sizes are stable.
    let err = product.evaluate().unwrap_err();
    assert!(
        matches!(err, EinsumError::Backend(BackendError::ShapeMismatch { expected: 3, got: 4, .. })),
        "{err}"
    );
}

#[test]
fn test_eager_raises_backend_errors_immediately() {
    let ctx = context();
    let _scope = ctx.enter_scope();
    let x = ctx.wrap_as_deferred(&tensor(&[2, 3], 1));
    let y = ctx.wrap_as_deferred(&tensor(&[4, 5], 2));

    let err = ctx.contract("ij,jk->ik", &[&x, &y], Execution::Eager).unwrap_err();

    assert!(err.is_backend_error());
}
