//! Helpers shared by the integration suite.

use std::rc::Rc;

use assert_approx_eq::assert_approx_eq;
use deferred_einsum::{get_symbol, CpuBackend, EinsumConfig, SharingContext};
use ndarray::{ArrayD, IxDyn};

pub type Context = SharingContext<CpuBackend<f64>>;

pub fn context() -> Context {
    SharingContext::new(CpuBackend::new())
}

pub fn context_with(config: EinsumConfig) -> Context {
    SharingContext::with_config(CpuBackend::new(), config)
}

/// Deterministic, non-symmetric test values; `seed` separates tensors of the
/// same shape.
pub fn tensor(shape: &[usize], seed: u64) -> Rc<ArrayD<f64>> {
    let size: usize = shape.iter().product();
    let values = (0..size as u64)
        .map(|i| {
            let mixed = (i + 1).wrapping_mul(2_654_435_761).wrapping_add(seed.wrapping_mul(40_503));
            (mixed % 1000) as f64 / 500.0 - 1.0
        })
        .collect();
    Rc::new(ArrayD::from_shape_vec(IxDyn(shape), values).unwrap())
}

pub fn assert_close(actual: &ArrayD<f64>, expected: &ArrayD<f64>) {
    assert_eq!(actual.shape(), expected.shape());
    for (a, e) in actual.iter().zip(expected) {
        assert_approx_eq!(a, e, 1e-9);
    }
}

/// Labels `"ab", "bc", ...` of a matrix chain over `size` matrices.
pub fn chain_names(size: usize) -> (Vec<char>, String) {
    let alphabet: Vec<char> = (0..=size).map(get_symbol).collect();
    let inputs = (0..size)
        .map(|i| alphabet[i..i + 2].iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(",");
    (alphabet, inputs)
}
