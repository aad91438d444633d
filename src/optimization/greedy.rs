//! Greedy contraction path optimization.
//!
//! O(n³) algorithm that repeatedly contracts the cheapest pair.

use std::collections::BTreeSet;

use super::cost::{ContractionCost, CostModel};
use super::path::{ContractionPath, ContractionStep, TensorState};
use crate::notation::{EinsumNotation, Labels};

/// Finds a contraction path using the greedy algorithm.
///
/// At each step, contracts the pair of tensors with lowest cost. Ties go to
/// the lexicographically first pair, so the path is a pure function of the
/// notation and shapes.
///
/// `notation` must not contain an ellipsis; expand it first.
pub fn greedy_path(
    notation: &EinsumNotation,
    shapes: &[&[usize]],
    cost_model: &CostModel,
) -> ContractionPath {
    let n = notation.num_inputs();
    if n < 2 {
        return ContractionPath::new();
    }

    let mut state = TensorState::new(
        shapes.iter().map(|s| s.to_vec()).collect(),
        notation.input_labels(),
    );
    let mut path = ContractionPath::with_capacity(n - 1);
    let output_set: BTreeSet<char> = notation.output_indices().iter().copied().collect();

    while state.len() > 1 {
        let step = find_best_pair(&state, &output_set, cost_model);
        state = state.apply(&step);
        path.push(step);
    }

    path
}

/// Finds the best pair to contract in the current state.
fn find_best_pair(
    state: &TensorState,
    output_indices: &BTreeSet<char>,
    cost_model: &CostModel,
) -> ContractionStep {
    let n = state.len();
    let mut best: Option<(ContractionCost, ContractionStep)> = None;

    for i in 0..n {
        for j in (i + 1)..n {
            let (step, cost) = evaluate_pair(state, i, j, output_indices, cost_model);
            if best.as_ref().is_none_or(|(best_cost, _)| cost < *best_cost) {
                best = Some((cost, step));
            }
        }
    }

    match best {
        Some((_, step)) => step,
        // Unreachable with n >= 2; keep the path well-formed regardless.
        None => ContractionStep::pair((0, 1), Labels::new(), Labels::new(), 0),
    }
}

/// Builds the step contracting positions `i` and `j` and prices it.
///
/// A label is summed out as soon as no other tensor and not the final output
/// needs it, whether it is shared by the pair or private to one side.
pub(crate) fn evaluate_pair(
    state: &TensorState,
    i: usize,
    j: usize,
    final_output: &BTreeSet<char>,
    cost_model: &CostModel,
) -> (ContractionStep, ContractionCost) {
    let mut kept_elsewhere = final_output.clone();
    for (k, labels) in state.indices.iter().enumerate() {
        if k != i && k != j {
            kept_elsewhere.extend(labels.iter().copied());
        }
    }

    let mut contracted = Labels::new();
    let mut result = Labels::new();
    for &c in state.indices[i].iter().chain(&state.indices[j]) {
        if contracted.contains(&c) || result.contains(&c) {
            continue;
        }
        if kept_elsewhere.contains(&c) {
            result.push(c);
        } else {
            contracted.push(c);
        }
    }
    contracted.sort_unstable();

    let cost = cost_model.compute_pairwise_cost(
        &state.shapes[i],
        &state.shapes[j],
        &state.indices[i],
        &state.indices[j],
        &contracted,
    );

    (ContractionStep::pair((i, j), contracted, result, cost.flops), cost)
}
