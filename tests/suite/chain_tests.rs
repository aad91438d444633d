//! Matrix chains contracted down to each open label.
//!
//! Every target of a chain shares prefixes and suffixes with its neighbours,
//! so building all targets in one scope should cost fewer nodes than building
//! each in a scope of its own.

use std::rc::Rc;

use deferred_einsum::{CpuBackend, Deferred, Execution};
use ndarray::ArrayD;
use pretty_assertions::assert_eq;

use crate::common::{assert_close, chain_names, context, tensor, Context};

fn chain_tensors(size: usize) -> Vec<Rc<ArrayD<f64>>> {
    (0..size).map(|i| tensor(&[2, 2], i as u64)).collect()
}

/// Contracts the chain once per target in the current scope.
fn contract_targets(
    ctx: &Context,
    tensors: &[Rc<ArrayD<f64>>],
    inputs: &str,
    targets: &[String],
) -> Vec<Deferred<CpuBackend>> {
    let handles: Vec<_> = tensors.iter().map(|t| ctx.wrap_as_deferred(t)).collect();
    let refs: Vec<_> = handles.iter().collect();
    targets
        .iter()
        .map(|target| {
            ctx.contract(&format!("{inputs}->{target}"), &refs, Execution::Deferred)
                .unwrap()
        })
        .collect()
}

fn shared_cost(size: usize, targets: &[String]) -> usize {
    let (_, inputs) = chain_names(size);
    let tensors = chain_tensors(size);
    let ctx = context();
    let scope = ctx.enter_scope();
    contract_targets(&ctx, &tensors, &inputs, targets);
    scope.cache().num_operations()
}

fn separate_cost(size: usize, targets: &[String]) -> usize {
    let (_, inputs) = chain_names(size);
    let tensors = chain_tensors(size);
    let ctx = context();
    targets
        .iter()
        .map(|target| {
            let scope = ctx.enter_scope();
            contract_targets(&ctx, &tensors, &inputs, core::slice::from_ref(target));
            scope.cache().num_operations()
        })
        .sum()
}

/// One open label per target: `a`, `b`, ...
fn single_targets(size: usize) -> Vec<String> {
    let (alphabet, _) = chain_names(size);
    alphabet.iter().map(|c| c.to_string()).collect()
}

/// One matrix position per target: `ab`, `bc`, ...
fn pair_targets(size: usize) -> Vec<String> {
    let (alphabet, _) = chain_names(size);
    (0..size).map(|i| alphabet[i..i + 2].iter().collect()).collect()
}

#[test]
fn test_chain_sharing_beats_separate_scopes() {
    for (size, shared, separate) in [(3, 6, 8), (4, 9, 15), (5, 14, 24)] {
        let targets = single_targets(size);
        let shared_ops = shared_cost(size, &targets);
        let separate_ops = separate_cost(size, &targets);

        assert!(shared_ops < separate_ops, "size {size}: {shared_ops} >= {separate_ops}");
        assert_eq!((shared_ops, separate_ops), (shared, separate), "size {size}");
    }
}

#[test]
fn test_chain_pair_targets_never_cost_more() {
    for size in 3..=6 {
        let targets = pair_targets(size);
        assert!(shared_cost(size, &targets) <= separate_cost(size, &targets), "size {size}");
    }
}

#[test]
fn test_chain_results_match_direct() {
    let size = 4;
    let (_, inputs) = chain_names(size);
    let tensors = chain_tensors(size);
    let targets = single_targets(size);
    let direct: Vec<&ArrayD<f64>> = tensors.iter().map(|t| t.as_ref()).collect();

    let ctx = context();
    let _scope = ctx.enter_scope();
    let results = contract_targets(&ctx, &tensors, &inputs, &targets);

    for (target, result) in targets.iter().zip(&results) {
        let equation = format!("{inputs}->{target}");
        let expected = ctx.backend().einsum_direct(&equation, &direct).unwrap();
        assert_close(&result.evaluate().unwrap(), &expected);
    }
}

#[test]
fn test_chain_shared_nodes_run_once() {
    let size = 5;
    let (_, inputs) = chain_names(size);
    let tensors = chain_tensors(size);
    let targets = single_targets(size);

    let ctx = context();
    let scope = ctx.enter_scope();
    let results = contract_targets(&ctx, &tensors, &inputs, &targets);
    for result in &results {
        result.evaluate().unwrap();
    }

    let cache = scope.cache();
    assert_eq!(cache.stats().executed, cache.num_operations());
    assert_eq!(cache.num_evaluated(), cache.num_operations());
}

#[test]
fn test_chain_cost_grows_monotonically() {
    let single: Vec<usize> = (1..=20).map(|size| shared_cost(size, &single_targets(size))).collect();
    let pairs: Vec<usize> = (1..=20).map(|size| shared_cost(size, &pair_targets(size))).collect();

    assert_eq!(&single[..5], &[2, 3, 6, 9, 14]);
    assert_eq!(&pairs[..5], &[0, 2, 6, 10, 14]);
    for costs in [&single, &pairs] {
        assert!(costs.windows(2).all(|w| w[0] <= w[1]), "{costs:?}");
    }
}
