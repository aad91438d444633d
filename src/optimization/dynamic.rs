//! Optimal contraction path via dynamic programming.
//!
//! Finds the globally optimal contraction order by trying all
//! bipartitions of every subset of tensors. Exponential in the number of
//! tensors, but optimal.

use std::collections::BTreeSet;

use hashbrown::HashMap;

use super::cost::{ContractionCost, CostModel};
use super::greedy::{evaluate_pair, greedy_path};
use super::path::{ContractionPath, TensorState};
use crate::notation::{EinsumNotation, Labels};

/// Maximum number of tensors for which DP is feasible.
/// For n tensors, there are 3^n subset splits to consider.
pub const MAX_DP_TENSORS: usize = 12;

/// Best way found to reduce one subset of tensors to a single tensor.
#[derive(Debug, Clone)]
struct Entry {
    cost: ContractionCost,
    /// Left half of the best split; `None` for single tensors.
    split: Option<u32>,
    labels: Labels,
}

/// Finds the optimal contraction path using dynamic programming.
///
/// Falls back to [`greedy_path`] above [`MAX_DP_TENSORS`] inputs.
/// `notation` must not contain an ellipsis; expand it first.
pub fn optimal_path(
    notation: &EinsumNotation,
    shapes: &[&[usize]],
    cost_model: &CostModel,
) -> ContractionPath {
    let n = notation.num_inputs();
    if n < 2 {
        return ContractionPath::new();
    }
    if n > MAX_DP_TENSORS {
        log::debug!("{n} inputs exceed the optimal search limit, using greedy");
        return greedy_path(notation, shapes, cost_model);
    }

    let input_labels = notation.input_labels();
    let output: BTreeSet<char> = notation.output_indices().iter().copied().collect();

    let mut dims: HashMap<char, usize> = HashMap::new();
    for (labels, shape) in input_labels.iter().zip(shapes) {
        for (&c, &d) in labels.iter().zip(shape.iter()) {
            dims.entry(c).and_modify(|e| *e = (*e).max(d)).or_insert(d);
        }
    }
    let shape_of = |labels: &[char]| -> Vec<usize> {
        labels.iter().map(|c| dims.get(c).copied().unwrap_or(1)).collect()
    };

    let full: u32 = (1u32 << n) - 1;
    let mut table: HashMap<u32, Entry> = HashMap::new();

    // Every proper subset of `subset` is numerically smaller, so one
    // ascending sweep sees children before parents.
    for subset in 1..=full {
        if subset.is_power_of_two() {
            let i = subset.trailing_zeros() as usize;
            let mut labels = Labels::new();
            for &c in &input_labels[i] {
                if !labels.contains(&c) {
                    labels.push(c);
                }
            }
            table.insert(subset, Entry { cost: ContractionCost::zero(), split: None, labels });
            continue;
        }

        let labels = surviving_labels(subset, &input_labels, &output);
        let lowest = subset & subset.wrapping_neg();
        let mut best: Option<Entry> = None;

        let mut left = (subset - 1) & subset;
        while left > 0 {
            let right = subset ^ left;
            if left & lowest != 0 {
                if let (Some(l), Some(r)) = (table.get(&left), table.get(&right)) {
                    let contracted: Labels = l
                        .labels
                        .iter()
                        .chain(&r.labels)
                        .copied()
                        .filter(|c| !labels.contains(c))
                        .collect::<BTreeSet<char>>()
                        .into_iter()
                        .collect();
                    let step_cost = cost_model.compute_pairwise_cost(
                        &shape_of(l.labels.as_slice()),
                        &shape_of(r.labels.as_slice()),
                        &l.labels,
                        &r.labels,
                        &contracted,
                    );
                    let total = l.cost + r.cost + step_cost;
                    if best.as_ref().is_none_or(|b| total < b.cost) {
                        best = Some(Entry { cost: total, split: Some(left), labels: labels.clone() });
                    }
                }
            }
            left = (left - 1) & subset;
        }

        if let Some(entry) = best {
            table.insert(subset, entry);
        }
    }

    linearize(full, &table, notation, shapes, &output, cost_model)
}

/// Labels of the tensors in `subset` still needed by the output or by a
/// tensor outside the subset.
fn surviving_labels(subset: u32, input_labels: &[Labels], output: &BTreeSet<char>) -> Labels {
    let mut needed = output.clone();
    for (i, labels) in input_labels.iter().enumerate() {
        if subset & (1 << i) == 0 {
            needed.extend(labels.iter().copied());
        }
    }

    let mut labels = Labels::new();
    for (i, input) in input_labels.iter().enumerate() {
        if subset & (1 << i) != 0 {
            for &c in input {
                if needed.contains(&c) && !labels.contains(&c) {
                    labels.push(c);
                }
            }
        }
    }
    labels
}

/// Turns the split tree into positional steps over a working list.
fn linearize(
    full: u32,
    table: &HashMap<u32, Entry>,
    notation: &EinsumNotation,
    shapes: &[&[usize]],
    output: &BTreeSet<char>,
    cost_model: &CostModel,
) -> ContractionPath {
    // Post-order over the split tree, left subtree first.
    let mut order: Vec<(u32, u32)> = Vec::new();
    let mut stack: Vec<(u32, bool)> = vec![(full, false)];
    while let Some((subset, expanded)) = stack.pop() {
        let Some(left) = table.get(&subset).and_then(|e| e.split) else {
            continue;
        };
        let right = subset ^ left;
        if expanded {
            order.push((left, right));
        } else {
            stack.push((subset, true));
            stack.push((right, false));
            stack.push((left, false));
        }
    }

    let mut state = TensorState::new(
        shapes.iter().map(|s| s.to_vec()).collect(),
        notation.input_labels(),
    );
    let mut members: Vec<u32> = (0..notation.num_inputs()).map(|i| 1u32 << i).collect();
    let mut path = ContractionPath::with_capacity(order.len());

    for (left, right) in order {
        let (Some(a), Some(b)) = (
            members.iter().position(|&m| m == left),
            members.iter().position(|&m| m == right),
        ) else {
            continue;
        };
        let (i, j) = if a < b { (a, b) } else { (b, a) };
        let (step, _) = evaluate_pair(&state, i, j, output, cost_model);
        state = state.apply(&step);
        members.remove(j);
        members.remove(i);
        members.push(left | right);
        path.push(step);
    }

    path
}
