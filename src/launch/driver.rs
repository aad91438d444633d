//! Contraction driver.
//!
//! Turns an equation into a chain of pairwise nodes in the active cache:
//! parse and validate, ask the path optimizer for steps, then emit one
//! lookup-or-insert per step. Nothing is computed unless eager execution is
//! requested.

use smallvec::SmallVec;

use super::scope::SharingContext;
use crate::backend::{Backend, EquationFragment};
use crate::deferred::{CacheHandle, Deferred, ExpressionCache, Lookup, NodeId};
use crate::error::{EinsumResult, EquationError, EquationResult};
use crate::notation::{parse_einsum, validate_notation, validate_ranks, Labels};
use crate::optimization::PathOptimizer;
use crate::pattern::recognize_step;

/// When a contraction's value is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Execution {
    /// Build the graph only; values are computed by [`Deferred::evaluate`].
    #[default]
    Deferred,
    /// Build the graph and evaluate it before returning.
    Eager,
}

impl<B: Backend> SharingContext<B> {
    /// Contracts `operands` according to `equation` using the configured
    /// path strategy.
    ///
    /// Equation problems (syntax, operand count, ranks, output labels,
    /// ellipsis) are reported here. Numeric problems, such as a label bound
    /// to two sizes, are reported when the result is evaluated, or here
    /// under [`Execution::Eager`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// let ctx = SharingContext::new(CpuBackend::<f64>::new());
    /// let _scope = ctx.enter_scope();
    /// let a = ctx.wrap_as_deferred(&a);
    /// let b = ctx.wrap_as_deferred(&b);
    /// let c = ctx.contract("ij,jk->ik", &[&a, &b], Execution::Deferred)?;
    /// let value = c.evaluate()?;
    /// ```
    pub fn contract(
        &self,
        equation: &str,
        operands: &[&Deferred<B>],
        execution: Execution,
    ) -> EinsumResult<Deferred<B>> {
        let optimizer = (self.config().strategy, self.config().cost_model.clone());
        self.contract_with(&optimizer, equation, operands, execution)
    }

    /// Like [`contract`](Self::contract), with an explicit path optimizer.
    ///
    /// Steps are taken exactly as the optimizer emits them.
    pub fn contract_with<O: PathOptimizer + ?Sized>(
        &self,
        optimizer: &O,
        equation: &str,
        operands: &[&Deferred<B>],
        execution: Execution,
    ) -> EinsumResult<Deferred<B>> {
        let notation = parse_einsum(equation)?;
        validate_notation(&notation)?;

        let shapes: Vec<Vec<usize>> = operands.iter().map(|operand| operand.shape()).collect();
        let shape_refs: Vec<&[usize]> = shapes.iter().map(Vec::as_slice).collect();
        let ellipsis_dims = validate_ranks(&notation, &shape_refs)?;
        let notation = notation.expand_ellipsis(&ellipsis_dims);

        let cache = self.working_cache();
        let mut working: Vec<(NodeId, Labels)> = operands
            .iter()
            .zip(notation.input_labels())
            .map(|(operand, labels)| (adopt(&cache, operand), labels))
            .collect();

        let path = optimizer.optimize(&notation, &shape_refs);
        let output: Labels = notation.output_indices().iter().copied().collect();
        let mut constructed = 0usize;
        let mut reused = 0usize;

        let root = {
            let mut nodes = cache.borrow_mut();
            let mut emit = |nodes: &mut ExpressionCache<B>,
                            inputs: &[(NodeId, Labels)],
                            result: Labels|
             -> EinsumResult<NodeId> {
                let lookup = pairwise(nodes, inputs, result)?;
                if lookup.is_reused() {
                    reused += 1;
                } else {
                    constructed += 1;
                }
                self.record(lookup, false);
                Ok(lookup.id())
            };

            for (index, step) in path.steps().iter().enumerate() {
                check_step(index, step.operands.as_slice(), working.len())?;
                let inputs: SmallVec<[(NodeId, Labels); 2]> =
                    step.operands.iter().map(|&p| working[p].clone()).collect();
                for position in step.removal_order() {
                    working.remove(position);
                }

                let result = if working.is_empty() {
                    output.clone()
                } else {
                    step.result_indices.clone()
                };
                let id = emit(&mut nodes, &inputs, result.clone())?;
                working.push((id, result));
            }

            match working.as_slice() {
                [(id, labels)] if *labels == output => *id,
                [single] => emit(&mut nodes, core::slice::from_ref(single), output.clone())?,
                _ => {
                    return Err(EquationError::IncompletePath {
                        remaining: working.len(),
                    }
                    .into());
                }
            }
        };

        log::debug!(
            "contract '{}': {} steps, {constructed} new, {reused} reused",
            notation.original().unwrap_or(equation),
            constructed + reused
        );

        let result = Deferred::new(root, cache, self.backend_rc());
        if execution == Execution::Eager {
            result.evaluate()?;
        }
        Ok(result)
    }
}

/// Node id of `operand` inside `cache`, importing it from a foreign cache.
fn adopt<B: Backend>(cache: &CacheHandle<B>, operand: &Deferred<B>) -> NodeId {
    if operand.cache().ptr_eq(cache) {
        return operand.id();
    }
    let source = operand.cache().borrow();
    let id = cache.borrow_mut().import(&source, operand.id());
    log::trace!("imported {} as {id}", operand.id());
    id
}

fn check_step(index: usize, positions: &[usize], available: usize) -> EinsumResult<()> {
    for (k, &position) in positions.iter().enumerate() {
        if position >= available || positions[..k].contains(&position) {
            return Err(EquationError::InvalidStep {
                step: index,
                position,
                available,
            }
            .into());
        }
    }
    Ok(())
}

/// Emits one step as a node, tensordot when the labels allow it.
fn pairwise<B: Backend>(
    cache: &mut ExpressionCache<B>,
    inputs: &[(NodeId, Labels)],
    result: Labels,
) -> EquationResult<Lookup> {
    let labels: SmallVec<[&[char]; 2]> = inputs.iter().map(|(_, l)| l.as_slice()).collect();
    let pattern = recognize_step(&labels, &result);
    let equation = EquationFragment::new(inputs.iter().map(|(_, l)| l.clone()), result);
    let reduced = equation.reduced_labels();
    let ids: SmallVec<[NodeId; 2]> = inputs.iter().map(|(id, _)| *id).collect();
    cache.make_pairwise(pattern, &equation, &ids, &reduced)
}
