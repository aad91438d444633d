//! Step classification tests.

use deferred_einsum::pattern::{recognize_step, tensordot_axes, StepPattern};
use deferred_einsum::{Execution, NodeKind};

use crate::common::{assert_close, context, tensor};

#[test]
fn test_recognize_matmul() {
    let pattern = recognize_step(&[&['i', 'j'], &['j', 'k']], &['i', 'k']);
    match pattern {
        StepPattern::Tensordot(axes) => {
            assert_eq!(axes.lhs.as_slice(), &[1]);
            assert_eq!(axes.rhs.as_slice(), &[0]);
        }
        StepPattern::Einsum => panic!("expected tensordot"),
    }
}

#[test]
fn test_recognize_transposed_operand() {
    let axes = tensordot_axes(&['j', 'i'], &['j', 'k'], &['i', 'k']).unwrap();
    assert_eq!(axes.lhs.as_slice(), &[0]);
    assert_eq!(axes.rhs.as_slice(), &[0]);
}

#[test]
fn test_recognize_batched_matmul_as_einsum() {
    let pattern = recognize_step(&[&['b', 'i', 'j'], &['b', 'j', 'k']], &['b', 'i', 'k']);
    assert_eq!(pattern, StepPattern::Einsum);
}

#[test]
fn test_recognize_reduction_as_einsum() {
    assert_eq!(recognize_step(&[&['i', 'j']], &['i']), StepPattern::Einsum);
}

#[test]
fn test_contract_picks_backend_primitive() {
    let ctx = context();
    let _scope = ctx.enter_scope();
    let a = tensor(&[3, 4], 1);
    let b = tensor(&[4, 5], 2);
    let c = tensor(&[3, 4, 5], 3);
    let (da, db, dc) = (ctx.wrap_as_deferred(&a), ctx.wrap_as_deferred(&b), ctx.wrap_as_deferred(&c));

    let cases = [
        ("ij,jk->ik", vec![&da, &db], NodeKind::Tensordot),
        ("ij,jk->ki", vec![&da, &db], NodeKind::Einsum),
        ("ij,ij->ij", vec![&da, &da], NodeKind::Einsum),
        ("ijk,ij->k", vec![&dc, &da], NodeKind::Tensordot),
        ("ijk->ki", vec![&dc], NodeKind::Einsum),
    ];

    for (equation, operands, kind) in cases {
        let result = ctx.contract(equation, &operands, Execution::Deferred).unwrap();
        assert_eq!(result.kind(), kind, "{equation}");

        let tensors: Vec<_> = operands.iter().map(|d| d.evaluate().unwrap()).collect();
        let refs: Vec<_> = tensors.iter().map(|t| t.as_ref()).collect();
        let expected = ctx.backend().einsum_direct(equation, &refs).unwrap();
        assert_close(&result.evaluate().unwrap(), &expected);
    }
}
