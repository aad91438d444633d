//! Contraction path optimization tests.

use deferred_einsum::notation::parse_einsum;
use deferred_einsum::optimization::{
    greedy_path, optimal_path, ContractionStrategy, CostModel, PathOptimizer,
};

#[test]
fn test_greedy_two_tensors() {
    let notation = parse_einsum("ij,jk->ik").unwrap();
    let shapes: &[&[usize]] = &[&[100, 200], &[200, 300]];
    let cost_model = CostModel::default();

    let path = greedy_path(&notation, shapes, &cost_model);
    assert_eq!(path.len(), 1);
}

#[test]
fn test_greedy_three_tensors() {
    let notation = parse_einsum("ij,jk,kl->il").unwrap();
    let shapes: &[&[usize]] = &[&[10, 20], &[20, 30], &[30, 40]];
    let cost_model = CostModel::default();

    let path = greedy_path(&notation, shapes, &cost_model);
    assert_eq!(path.len(), 2);
    let mut last = path.steps()[1].result_indices.to_vec();
    last.sort_unstable();
    assert_eq!(last, vec!['i', 'l']);
}

#[test]
fn test_optimal_three_tensors() {
    let notation = parse_einsum("ij,jk,kl->il").unwrap();
    let shapes: &[&[usize]] = &[&[10, 20], &[20, 30], &[30, 40]];
    let cost_model = CostModel::default();

    let path = optimal_path(&notation, shapes, &cost_model);
    assert_eq!(path.len(), 2);
}

#[test]
fn test_scalar_chain_contracts_small_pair_first() {
    // y@z sums two labels into a length-4 vector; x@y would only sum one.
    let notation = parse_einsum("ab,bc,cd->").unwrap();
    let shapes: &[&[usize]] = &[&[5, 4], &[4, 3], &[3, 2]];

    let path = ContractionStrategy::Auto.optimize(&notation, shapes);

    assert_eq!(path.steps()[0].operands.as_slice(), &[1, 2]);
    assert_eq!(path.steps()[0].result_indices.as_slice(), &['b']);
    assert!(path.steps()[1].result_indices.is_empty());
}

#[test]
fn test_paths_are_deterministic() {
    let notation = parse_einsum("ab,bc,cd,de,ef,fg->ag").unwrap();
    let shapes: &[&[usize]] = &[&[2, 2], &[2, 2], &[2, 2], &[2, 2], &[2, 2], &[2, 2]];

    for strategy in [ContractionStrategy::Greedy, ContractionStrategy::Optimal] {
        let first = strategy.optimize(&notation, shapes);
        let second = strategy.optimize(&notation, shapes);
        assert_eq!(first.steps(), second.steps());
    }
}

#[test]
fn test_cost_model() {
    let model = CostModel::default();

    let cost = model.compute_pairwise_cost(
        &[100, 200],
        &[200, 300],
        &['i', 'j'],
        &['j', 'k'],
        &['j'],
    );

    // FLOPs = M * N * K * 2 = 100 * 300 * 200 * 2 = 12,000,000
    assert_eq!(cost.flops, 12_000_000);
}

#[test]
fn test_custom_cost_model_optimizer() {
    let notation = parse_einsum("ij,jk,kl->il").unwrap();
    let shapes: &[&[usize]] = &[&[2, 10], &[10, 1000], &[1000, 3]];

    let path = (ContractionStrategy::Greedy, CostModel::flops_only()).optimize(&notation, shapes);

    assert_eq!(path.steps()[0].operands.as_slice(), &[0, 1]);
}
