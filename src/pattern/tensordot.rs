//! Tensordot detection for pairwise steps.

use smallvec::SmallVec;

/// Matched axis pairs of a tensordot: `lhs[k]` is summed against `rhs[k]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TensordotAxes {
    pub lhs: SmallVec<[usize; 4]>,
    pub rhs: SmallVec<[usize; 4]>,
}

impl TensordotAxes {
    /// Number of contracted axis pairs.
    pub fn len(&self) -> usize {
        self.lhs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lhs.is_empty()
    }
}

fn has_repeats(labels: &[char]) -> bool {
    labels
        .iter()
        .enumerate()
        .any(|(pos, c)| labels[..pos].contains(c))
}

/// Checks whether `lhs,rhs->output` is a pure contraction.
///
/// That holds when:
/// - no label repeats inside an operand (no diagonals),
/// - every shared label is summed (no batch dimensions),
/// - every private label survives (no one-sided reductions),
/// - the output is the lhs free labels followed by the rhs free labels,
///   the order a tensordot produces.
///
/// Returns the matched axes, ordered by position in `lhs`.
pub fn tensordot_axes(lhs: &[char], rhs: &[char], output: &[char]) -> Option<TensordotAxes> {
    if has_repeats(lhs) || has_repeats(rhs) || has_repeats(output) {
        return None;
    }

    let mut axes = TensordotAxes::default();
    let mut expected_output: SmallVec<[char; 8]> = SmallVec::new();

    for (i, c) in lhs.iter().enumerate() {
        match rhs.iter().position(|r| r == c) {
            Some(j) => {
                if output.contains(c) {
                    return None;
                }
                axes.lhs.push(i);
                axes.rhs.push(j);
            }
            None => expected_output.push(*c),
        }
    }
    expected_output.extend(rhs.iter().copied().filter(|c| !lhs.contains(c)));

    (expected_output.as_slice() == output).then_some(axes)
}
