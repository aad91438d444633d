//! Bottom-up evaluation of cached nodes.

use std::rc::Rc;

use smallvec::SmallVec;

use super::cache::ExpressionCache;
use super::node::{NodeBody, NodeId, NodeOp};
use crate::backend::Backend;
use crate::error::{BackendError, BackendResult};

impl<B: Backend> ExpressionCache<B> {
    /// Computes the value of `root`, running every missing operation below
    /// it exactly once.
    ///
    /// The DAG is walked in post-order with an explicit stack, so depth is
    /// bounded by memory rather than the call stack. Values are memoized for
    /// the lifetime of the cache; a failed operation memoizes nothing and
    /// leaves already computed operands in place.
    pub fn evaluate(&mut self, backend: &B, root: NodeId) -> BackendResult<Rc<B::Tensor>> {
        if root.0 >= self.nodes.len() {
            return Err(BackendError::failure(format!("node {root} is not in this cache")));
        }
        if let Some(value) = &self.values[root.0] {
            if !self.nodes[root.0].is_leaf() {
                self.stats.memo_hits += 1;
            }
            return Ok(Rc::clone(value));
        }

        let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if self.values[id.0].is_some() {
                if !expanded {
                    self.stats.memo_hits += 1;
                }
                continue;
            }
            let NodeBody::Op(key) = &self.nodes[id.0].body else {
                continue;
            };

            if !expanded {
                stack.push((id, true));
                for &operand in key.operands.iter().rev() {
                    match &self.values[operand.0] {
                        Some(_) if !self.nodes[operand.0].is_leaf() => self.stats.memo_hits += 1,
                        Some(_) => {}
                        None => stack.push((operand, false)),
                    }
                }
                continue;
            }

            let inputs: SmallVec<[Rc<B::Tensor>; 2]> = key
                .operands
                .iter()
                .map(|o| self.values[o.0].clone())
                .collect::<Option<_>>()
                .ok_or_else(|| BackendError::failure(format!("operands of {id} are not evaluated")))?;
            let refs: SmallVec<[&B::Tensor; 2]> = inputs.iter().map(|t| t.as_ref()).collect();

            let value = match &key.op {
                NodeOp::Einsum { equation, .. } => backend.einsum(equation, &refs)?,
                NodeOp::Tensordot { axes, .. } => match refs.as_slice() {
                    [lhs, rhs] => backend.tensordot(lhs, rhs, axes)?,
                    _ => {
                        return Err(BackendError::axes(format!(
                            "tensordot {id} has {} operands",
                            refs.len()
                        )));
                    }
                },
            };

            if self.debug {
                log::trace!("evaluated {id} {} {}", key.op.kind(), key.op.equation());
            }
            self.stats.executed += 1;
            self.values[id.0] = Some(Rc::new(value));
        }

        self.values[root.0]
            .clone()
            .ok_or_else(|| BackendError::failure(format!("node {root} produced no value")))
    }
}
