//! Caller-facing handle to a cached node.

use core::fmt;
use std::rc::Rc;

use super::cache::CacheHandle;
use super::node::{NodeId, NodeKind};
use crate::backend::Backend;
use crate::error::EinsumResult;

/// A lazily evaluated tensor.
///
/// Cloning a handle is cheap; every clone points at the same node. The
/// handle keeps its cache alive, so it stays evaluable after the scope that
/// produced it is gone.
///
/// Handles are only created for ids their cache issued, and a cache never
/// removes nodes, so the node behind `id` always exists.
pub struct Deferred<B: Backend> {
    pub(crate) id: NodeId,
    pub(crate) cache: CacheHandle<B>,
    pub(crate) backend: Rc<B>,
}

impl<B: Backend> Clone for Deferred<B> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            cache: self.cache.clone(),
            backend: Rc::clone(&self.backend),
        }
    }
}

impl<B: Backend> fmt::Debug for Deferred<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("shape", &self.shape())
            .finish()
    }
}

impl<B: Backend> Deferred<B> {
    pub(crate) fn new(id: NodeId, cache: CacheHandle<B>, backend: Rc<B>) -> Self {
        Self { id, cache, backend }
    }

    /// Computes the value, running only operations not evaluated before in
    /// this handle's cache.
    ///
    /// Backend failures (for example a label bound to two sizes) surface here.
    pub fn evaluate(&self) -> EinsumResult<Rc<B::Tensor>> {
        let value = self.cache.borrow_mut().evaluate(&self.backend, self.id)?;
        Ok(value)
    }

    /// Shape of the value, known without evaluating.
    ///
    /// Empty only for a scalar result.
    pub fn shape(&self) -> Vec<usize> {
        self.cache
            .borrow()
            .node(self.id)
            .map(|node| node.shape().to_vec())
            .unwrap_or_default()
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn kind(&self) -> NodeKind {
        self.cache
            .borrow()
            .node(self.id)
            .map_or(NodeKind::Leaf, |node| node.kind())
    }

    pub fn is_leaf(&self) -> bool {
        self.kind() == NodeKind::Leaf
    }

    /// Returns true once a value is memoized. Leaves always are.
    pub fn is_evaluated(&self) -> bool {
        self.cache.borrow().is_evaluated(self.id)
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The cache owning this handle's node.
    #[inline]
    pub fn cache(&self) -> &CacheHandle<B> {
        &self.cache
    }
}
