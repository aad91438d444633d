//! Reference CPU backend on `ndarray`.

use core::marker::PhantomData;

use hashbrown::HashMap;
use ndarray::{ArrayD, Axis, CowArray, IxDyn, LinalgScalar};
use smallvec::SmallVec;

use super::{Backend, EquationFragment};
use crate::error::{BackendError, BackendResult, EinsumResult};
use crate::notation::{parse_einsum, validate_notation, validate_ranks, Labels};
use crate::pattern::TensordotAxes;

/// Dense CPU backend over [`ArrayD`].
///
/// Einsum steps run as a single strided loop over every label, which also
/// covers diagonals (`ii->i`) and broadcasting. Tensordot steps are lowered
/// to one matrix product.
#[derive(Debug, Clone, Copy)]
pub struct CpuBackend<E = f64> {
    _element: PhantomData<E>,
}

impl<E> Default for CpuBackend<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> CpuBackend<E> {
    pub const fn new() -> Self {
        Self {
            _element: PhantomData,
        }
    }
}

impl<E: LinalgScalar> CpuBackend<E> {
    /// Evaluates a full multi-operand equation in one pass, without paths or
    /// caching.
    ///
    /// Serves as the numeric reference for deferred evaluation. Implicit
    /// output and ellipsis are accepted.
    pub fn einsum_direct(&self, equation: &str, operands: &[&ArrayD<E>]) -> EinsumResult<ArrayD<E>> {
        let notation = parse_einsum(equation)?;
        validate_notation(&notation)?;

        let shapes: Vec<&[usize]> = operands.iter().map(|t| t.shape()).collect();
        let ellipsis_dims = validate_ranks(&notation, &shapes)?;
        let notation = notation.expand_ellipsis(&ellipsis_dims);

        let fragment = EquationFragment::new(notation.input_labels(), notation.output().labels());
        Ok(self.einsum(&fragment, operands)?)
    }
}

/// Row-major strides of a standard layout array.
fn row_major_strides(shape: &[usize]) -> SmallVec<[usize; 8]> {
    let mut strides: SmallVec<[usize; 8]> = SmallVec::from_elem(1, shape.len());
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

fn subscript_string(labels: &Labels) -> String {
    labels.iter().collect()
}

impl<E: LinalgScalar> Backend for CpuBackend<E> {
    type Tensor = ArrayD<E>;

    fn shape(&self, tensor: &ArrayD<E>) -> Vec<usize> {
        tensor.shape().to_vec()
    }

    fn einsum(&self, equation: &EquationFragment, operands: &[&ArrayD<E>]) -> BackendResult<ArrayD<E>> {
        if operands.len() != equation.num_inputs() {
            return Err(BackendError::failure(format!(
                "'{equation}' takes {} operands, got {}",
                equation.num_inputs(),
                operands.len()
            )));
        }

        let mut dims: HashMap<char, usize> = HashMap::new();
        for (labels, tensor) in equation.inputs.iter().zip(operands) {
            if labels.len() != tensor.ndim() {
                return Err(BackendError::RankMismatch {
                    subscript: subscript_string(labels),
                    expected: labels.len(),
                    got: tensor.ndim(),
                });
            }
            for (&c, &d) in labels.iter().zip(tensor.shape()) {
                match dims.get(&c) {
                    Some(&existing) if existing == d || d == 1 => {}
                    Some(&1) | None => {
                        dims.insert(c, d);
                    }
                    Some(&existing) => return Err(BackendError::shape(c, existing, d)),
                }
            }
        }

        // Loop order: output labels outermost, summed labels innermost.
        let mut order: Labels = Labels::new();
        for &c in &equation.output {
            if !dims.contains_key(&c) {
                return Err(BackendError::failure(format!(
                    "output label '{c}' of '{equation}' is not bound by any operand"
                )));
            }
            order.push(c);
        }
        for &c in equation.inputs.iter().flatten() {
            if !order.contains(&c) {
                order.push(c);
            }
        }
        let extents: SmallVec<[usize; 8]> = order.iter().map(|c| dims[c]).collect();
        let output_shape: Vec<usize> = extents[..equation.output.len()].to_vec();
        let output_size: usize = output_shape.iter().product();
        let summed_size: usize = extents[equation.output.len()..].iter().product();

        let layouts: Vec<_> = operands.iter().map(|t| t.as_standard_layout()).collect();
        let mut slices: SmallVec<[&[E]; 4]> = SmallVec::new();
        for layout in &layouts {
            let data = layout
                .as_slice()
                .ok_or_else(|| BackendError::failure("operand is not contiguous"))?;
            slices.push(data);
        }

        // A label repeated inside one operand walks its diagonal: the strides
        // of its axes add up. A size-1 axis broadcasts with stride 0.
        let strides: Vec<SmallVec<[usize; 8]>> = equation
            .inputs
            .iter()
            .zip(operands)
            .map(|(labels, tensor)| {
                let axis_strides = row_major_strides(tensor.shape());
                order
                    .iter()
                    .map(|c| {
                        labels
                            .iter()
                            .zip(&axis_strides)
                            .zip(tensor.shape())
                            .filter(|&((ref l, _), &d)| *l == c && d != 1)
                            .map(|((_, s), _)| *s)
                            .sum()
                    })
                    .collect()
            })
            .collect();

        let mut counter: SmallVec<[usize; 8]> = SmallVec::from_elem(0, order.len());
        let mut offsets: SmallVec<[usize; 4]> = SmallVec::from_elem(0, slices.len());
        let mut values: Vec<E> = Vec::with_capacity(output_size);

        for _ in 0..output_size {
            let mut acc = E::zero();
            for _ in 0..summed_size {
                let mut product = E::one();
                for (data, &offset) in slices.iter().zip(&offsets) {
                    product = product * data[offset];
                }
                acc = acc + product;

                for axis in (0..order.len()).rev() {
                    counter[axis] += 1;
                    for (offset, operand_strides) in offsets.iter_mut().zip(&strides) {
                        *offset += operand_strides[axis];
                    }
                    if counter[axis] < extents[axis] {
                        break;
                    }
                    for (offset, operand_strides) in offsets.iter_mut().zip(&strides) {
                        *offset -= operand_strides[axis] * extents[axis];
                    }
                    counter[axis] = 0;
                }
            }
            values.push(acc);
        }

        ArrayD::from_shape_vec(IxDyn(&output_shape), values)
            .map_err(|err| BackendError::failure(format!("einsum '{equation}': {err}")))
    }

    fn tensordot(&self, lhs: &ArrayD<E>, rhs: &ArrayD<E>, axes: &TensordotAxes) -> BackendResult<ArrayD<E>> {
        if axes.lhs.len() != axes.rhs.len() {
            return Err(BackendError::axes(format!(
                "{} lhs axes paired with {} rhs axes",
                axes.lhs.len(),
                axes.rhs.len()
            )));
        }
        for (pos, (&a, &b)) in axes.lhs.iter().zip(&axes.rhs).enumerate() {
            if a >= lhs.ndim() || b >= rhs.ndim() {
                return Err(BackendError::axes(format!(
                    "axis pair ({a}, {b}) out of range for ranks {} and {}",
                    lhs.ndim(),
                    rhs.ndim()
                )));
            }
            if axes.lhs[..pos].contains(&a) || axes.rhs[..pos].contains(&b) {
                return Err(BackendError::axes(format!("axis pair ({a}, {b}) repeats an axis")));
            }
        }

        // A paired axis of size 1 broadcasts: sum the other side down to size 1.
        let mut lhs = CowArray::from(lhs.view());
        let mut rhs = CowArray::from(rhs.view());
        for (&a, &b) in axes.lhs.iter().zip(&axes.rhs) {
            match (lhs.shape()[a], rhs.shape()[b]) {
                (x, y) if x == y => {}
                (1, _) => rhs = CowArray::from(rhs.sum_axis(Axis(b)).insert_axis(Axis(b))),
                (_, 1) => lhs = CowArray::from(lhs.sum_axis(Axis(a)).insert_axis(Axis(a))),
                (x, y) => {
                    return Err(BackendError::axes(format!(
                        "axis {a} has size {x} but paired axis {b} has size {y}"
                    )));
                }
            }
        }

        let lhs_free: Vec<usize> = (0..lhs.ndim()).filter(|a| !axes.lhs.contains(a)).collect();
        let rhs_free: Vec<usize> = (0..rhs.ndim()).filter(|a| !axes.rhs.contains(a)).collect();

        let m: usize = lhs_free.iter().map(|&a| lhs.shape()[a]).product();
        let n: usize = rhs_free.iter().map(|&a| rhs.shape()[a]).product();
        let k: usize = axes.lhs.iter().map(|&a| lhs.shape()[a]).product();

        let lhs_order: Vec<usize> = lhs_free.iter().chain(&axes.lhs).copied().collect();
        let rhs_order: Vec<usize> = axes.rhs.iter().chain(&rhs_free).copied().collect();

        let reshape_err = |err: ndarray::ShapeError| BackendError::failure(format!("tensordot reshape: {err}"));
        let a = lhs.view().permuted_axes(lhs_order);
        let a = a.to_shape((m, k)).map_err(reshape_err)?;
        let b = rhs.view().permuted_axes(rhs_order);
        let b = b.to_shape((k, n)).map_err(reshape_err)?;

        let output_shape: Vec<usize> = lhs_free
            .iter()
            .map(|&ax| lhs.shape()[ax])
            .chain(rhs_free.iter().map(|&ax| rhs.shape()[ax]))
            .collect();

        // `dot` may pick a column-major result (outer products do).
        let product = a.dot(&b);
        let product = product.as_standard_layout().into_owned();
        product
            .into_dyn()
            .into_shape_with_order(output_shape)
            .map_err(reshape_err)
    }
}
