//! Cost model for contraction operations.

use hashbrown::HashMap;

use crate::notation::Labels;

/// Cost of a single contraction operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContractionCost {
    /// Number of floating-point operations.
    pub flops: u64,
    /// Memory traffic in elements.
    pub memory: u64,
    /// Combined cost using the cost model.
    pub total: u64,
}

impl ContractionCost {
    pub fn new(flops: u64, memory: u64, alpha: u64) -> Self {
        let total = flops.saturating_add(memory.saturating_mul(alpha));
        Self { flops, memory, total }
    }

    pub fn zero() -> Self {
        Self { flops: 0, memory: 0, total: 0 }
    }
}

impl core::ops::Add for ContractionCost {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            flops: self.flops.saturating_add(rhs.flops),
            memory: self.memory.saturating_add(rhs.memory),
            total: self.total.saturating_add(rhs.total),
        }
    }
}

impl Ord for ContractionCost {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.total.cmp(&other.total)
    }
}

impl PartialOrd for ContractionCost {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for ContractionCost {}

/// Cost model for evaluating contraction operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostModel {
    /// Memory traffic penalty factor.
    /// Higher values penalize large intermediates more.
    pub alpha: u64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self::cpu()
    }
}

impl CostModel {
    pub fn cpu() -> Self {
        Self { alpha: 8 }
    }

    /// Counts FLOPs only.
    pub fn flops_only() -> Self {
        Self { alpha: 0 }
    }

    /// Computes the cost of contracting two tensors.
    ///
    /// `contracted` holds the labels summed out by the step; every other
    /// label of either input survives into the result exactly once.
    pub fn compute_pairwise_cost(
        &self,
        shape_a: &[usize],
        shape_b: &[usize],
        indices_a: &[char],
        indices_b: &[char],
        contracted: &[char],
    ) -> ContractionCost {
        let mut dim_map: HashMap<char, usize> = HashMap::new();
        for (&c, &d) in indices_a.iter().zip(shape_a).chain(indices_b.iter().zip(shape_b)) {
            dim_map.entry(c).and_modify(|e| *e = (*e).max(d)).or_insert(d);
        }

        let mut result: Labels = Labels::new();
        for &c in indices_a.iter().chain(indices_b) {
            if !contracted.contains(&c) && !result.contains(&c) {
                result.push(c);
            }
        }

        let size_of = |labels: &[char]| -> u64 {
            labels
                .iter()
                .filter_map(|c| dim_map.get(c))
                .fold(1u64, |acc, &d| acc.saturating_mul(d as u64))
        };
        let output_size = size_of(result.as_slice());
        let contracted_size = size_of(contracted);

        // FLOPs = output_size * contracted_size * 2 (mul + add)
        let flops = output_size.saturating_mul(contracted_size).saturating_mul(2);

        let input_a_size: u64 = shape_a.iter().map(|&d| d as u64).product();
        let input_b_size: u64 = shape_b.iter().map(|&d| d as u64).product();
        let memory = input_a_size
            .saturating_add(input_b_size)
            .saturating_add(output_size);

        ContractionCost::new(flops, memory, self.alpha)
    }
}
