//! Content-addressed store of symbolic nodes and their memoized values.

use core::cell::{Ref, RefCell, RefMut};
use core::fmt;
use std::rc::Rc;

use hashbrown::HashMap;
use smallvec::SmallVec;

use super::node::{leaf_identity, result_shape, Node, NodeBody, NodeId, NodeKey, NodeOp, Operands};
use crate::backend::{Backend, EquationFragment};
use crate::error::{EquationError, EquationResult};
use crate::notation::Labels;
use crate::pattern::StepPattern;

/// Counters kept by an [`ExpressionCache`].
///
/// `constructed` and `reused` count operation nodes only; leaves are
/// reported by [`ExpressionCache::num_leaves`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheStats {
    /// Operation nodes inserted.
    pub constructed: usize,
    /// Lookups answered by an existing operation node.
    pub reused: usize,
    /// Numeric operations run by the backend.
    pub executed: usize,
    /// Evaluations answered by a memoized value.
    pub memo_hits: usize,
}

/// Outcome of a lookup-or-insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Constructed(NodeId),
    Reused(NodeId),
}

impl Lookup {
    #[inline]
    pub fn id(self) -> NodeId {
        match self {
            Self::Constructed(id) | Self::Reused(id) => id,
        }
    }

    #[inline]
    pub fn is_reused(self) -> bool {
        matches!(self, Self::Reused(_))
    }
}

/// Arena of symbolic nodes with one instance per distinct key.
///
/// Leaves are deduplicated by tensor identity, operations by [`NodeKey`].
/// Values are memoized per node and live as long as the cache.
pub struct ExpressionCache<B: Backend> {
    pub(crate) nodes: Vec<Node<B::Tensor>>,
    index: HashMap<NodeKey, NodeId>,
    leaves: HashMap<usize, NodeId>,
    pub(crate) values: Vec<Option<Rc<B::Tensor>>>,
    pub(crate) stats: CacheStats,
    pub(crate) debug: bool,
}

impl<B: Backend> Default for ExpressionCache<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> fmt::Debug for ExpressionCache<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionCache")
            .field("len", &self.len())
            .field("operations", &self.num_operations())
            .field("evaluated", &self.num_evaluated())
            .field("stats", &self.stats)
            .finish()
    }
}

impl<B: Backend> ExpressionCache<B> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            leaves: HashMap::new(),
            values: Vec::new(),
            stats: CacheStats::default(),
            debug: false,
        }
    }

    /// Enables trace logging of node construction, reuse and evaluation.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Returns the leaf for `tensor`, inserting it on first sight.
    ///
    /// Identity is the shared allocation: clones of one `Rc` map to one leaf,
    /// separately allocated tensors never do. The cache holds a reference, so
    /// an identity cannot be recycled while the cache lives.
    pub fn make_leaf(&mut self, tensor: &Rc<B::Tensor>, shape: Vec<usize>) -> Lookup {
        let identity = leaf_identity(tensor);
        if let Some(&id) = self.leaves.get(&identity) {
            return Lookup::Reused(id);
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::leaf(Rc::clone(tensor), shape));
        self.values.push(Some(Rc::clone(tensor)));
        self.leaves.insert(identity, id);
        if self.debug {
            log::trace!("leaf {id} {:?}", self.nodes[id.0].shape());
        }
        Lookup::Constructed(id)
    }

    /// Returns the node computing `equation` over `operands`, inserting it if
    /// no structurally identical node exists.
    ///
    /// Labels are renamed to a canonical alphabet first, so steps that differ
    /// only by label names share one node. No numeric work happens here.
    ///
    /// Fails if an operand id was not issued by this cache.
    pub fn make_pairwise(
        &mut self,
        pattern: StepPattern,
        equation: &EquationFragment,
        operands: &[NodeId],
        reduced: &[char],
    ) -> EquationResult<Lookup> {
        if let Some(unknown) = operands.iter().find(|o| o.0 >= self.nodes.len()) {
            return Err(EquationError::UnknownNode {
                node: unknown.0,
                len: self.nodes.len(),
            });
        }
        let (equation, mapping) = equation.canonicalize();
        let op = match pattern {
            StepPattern::Tensordot(axes) => NodeOp::Tensordot { equation, axes },
            StepPattern::Einsum => {
                let mut reduced: Labels = reduced
                    .iter()
                    .map(|c| {
                        mapping
                            .iter()
                            .find(|(old, _)| old == c)
                            .map_or(*c, |(_, new)| *new)
                    })
                    .collect();
                reduced.sort_unstable();
                reduced.dedup();
                NodeOp::Einsum { equation, reduced }
            }
        };
        Ok(self.intern(op, operands.iter().copied().collect()))
    }

    /// Lookup-or-insert of an operation whose labels are already canonical.
    fn intern(&mut self, op: NodeOp, operands: Operands) -> Lookup {
        let key = NodeKey { op, operands };
        if let Some(&id) = self.index.get(&key) {
            self.stats.reused += 1;
            if self.debug {
                log::trace!("reuse {id} {} {}", key.op.kind(), key.op.equation());
            }
            return Lookup::Reused(id);
        }

        let shape = {
            let shapes: SmallVec<[&[usize]; 2]> =
                key.operands.iter().map(|o| self.nodes[o.0].shape()).collect();
            result_shape(key.op.equation(), &shapes)
        };

        let id = NodeId(self.nodes.len());
        if self.debug {
            log::trace!("new {id} {} {} {:?}", key.op.kind(), key.op.equation(), key.operands);
        }
        self.index.insert(key.clone(), id);
        self.nodes.push(Node::op(key, shape));
        self.values.push(None);
        self.stats.constructed += 1;
        Lookup::Constructed(id)
    }

    /// Copies the sub-DAG rooted at `root` of another cache into this one,
    /// deduplicating against what is already here. Memoized values travel
    /// along.
    pub fn import(&mut self, other: &ExpressionCache<B>, root: NodeId) -> NodeId {
        let mut mapped: HashMap<NodeId, NodeId> = HashMap::new();
        let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];

        while let Some((id, expanded)) = stack.pop() {
            if mapped.contains_key(&id) {
                continue;
            }
            let node = &other.nodes[id.0];
            let local = match &node.body {
                NodeBody::Leaf(tensor) => self.make_leaf(tensor, node.shape.clone()).id(),
                NodeBody::Op(key) if expanded => {
                    let operands: Operands = key.operands.iter().map(|o| mapped[o]).collect();
                    self.intern(key.op.clone(), operands).id()
                }
                NodeBody::Op(key) => {
                    stack.push((id, true));
                    stack.extend(key.operands.iter().rev().map(|&o| (o, false)));
                    continue;
                }
            };
            if self.values[local.0].is_none() {
                self.values[local.0] = other.values[id.0].clone();
            }
            mapped.insert(id, local);
        }

        mapped.get(&root).copied().unwrap_or(root)
    }

    /// Total number of nodes, leaves included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn num_leaves(&self) -> usize {
        self.leaves.len()
    }

    /// Number of einsum and tensordot nodes.
    #[inline]
    pub fn num_operations(&self) -> usize {
        self.nodes.len() - self.leaves.len()
    }

    /// Number of operation nodes holding a memoized value.
    pub fn num_evaluated(&self) -> usize {
        self.nodes
            .iter()
            .zip(&self.values)
            .filter(|(node, value)| !node.is_leaf() && value.is_some())
            .count()
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<B::Tensor>> {
        self.nodes.get(id.0)
    }

    /// Memoized value of a node; leaves always have one.
    pub fn value(&self, id: NodeId) -> Option<&Rc<B::Tensor>> {
        self.values.get(id.0).and_then(Option::as_ref)
    }

    #[inline]
    pub fn is_evaluated(&self, id: NodeId) -> bool {
        self.value(id).is_some()
    }
}

/// Shared ownership of an [`ExpressionCache`].
///
/// Scope frames and deferred handles hold one each; the cache is dropped
/// with the last of them. Pass a handle to
/// [`SharingContext::resume_scope`](crate::launch::SharingContext::resume_scope)
/// to keep deduplicating against it later.
pub struct CacheHandle<B: Backend> {
    inner: Rc<RefCell<ExpressionCache<B>>>,
}

impl<B: Backend> Clone for CacheHandle<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B: Backend> Default for CacheHandle<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> fmt::Debug for CacheHandle<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(cache) => fmt::Debug::fmt(&*cache, f),
            Err(_) => f.write_str("ExpressionCache { <borrowed> }"),
        }
    }
}

impl<B: Backend> CacheHandle<B> {
    /// Creates a handle to a fresh, empty cache.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ExpressionCache::new())),
        }
    }

    /// Returns true if both handles refer to the same cache.
    #[inline]
    pub fn ptr_eq(&self, other: &CacheHandle<B>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn borrow(&self) -> Ref<'_, ExpressionCache<B>> {
        self.inner.borrow()
    }

    pub(crate) fn borrow_mut(&self) -> RefMut<'_, ExpressionCache<B>> {
        self.inner.borrow_mut()
    }

    pub(crate) fn debug(&self) -> bool {
        self.inner.try_borrow().is_ok_and(|cache| cache.debug)
    }

    pub(crate) fn set_debug(&self, debug: bool) {
        if let Ok(mut cache) = self.inner.try_borrow_mut() {
            cache.set_debug(debug);
        }
    }

    pub fn len(&self) -> usize {
        self.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.borrow().is_empty()
    }

    pub fn num_operations(&self) -> usize {
        self.borrow().num_operations()
    }

    pub fn num_evaluated(&self) -> usize {
        self.borrow().num_evaluated()
    }

    pub fn stats(&self) -> CacheStats {
        self.borrow().stats()
    }
}
