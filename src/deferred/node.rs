//! Symbolic nodes of the expression DAG.

use core::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::backend::EquationFragment;
use crate::notation::Labels;
use crate::pattern::TensordotAxes;

/// Index of a node inside its [`ExpressionCache`](super::ExpressionCache).
///
/// Ids are only meaningful for the cache that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Operand list of a node.
pub type Operands = SmallVec<[NodeId; 2]>;

/// What a node computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// A caller-supplied tensor.
    Leaf,
    /// Elementwise product of the operands, then a sum over reduced labels.
    Einsum,
    /// Pairwise contraction over matched axes.
    Tensordot,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf => f.write_str("leaf"),
            Self::Einsum => f.write_str("einsum"),
            Self::Tensordot => f.write_str("tensordot"),
        }
    }
}

/// Everything needed to replay an operation, labels already canonical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeOp {
    Einsum {
        equation: EquationFragment,
        reduced: Labels,
    },
    Tensordot {
        equation: EquationFragment,
        axes: TensordotAxes,
    },
}

impl NodeOp {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Einsum { .. } => NodeKind::Einsum,
            Self::Tensordot { .. } => NodeKind::Tensordot,
        }
    }

    pub fn equation(&self) -> &EquationFragment {
        match self {
            Self::Einsum { equation, .. } | Self::Tensordot { equation, .. } => equation,
        }
    }
}

/// Content key of an operation node.
///
/// Operands are keyed by id: within one cache every distinct sub-expression
/// has exactly one id, so equal ids mean equal sub-expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub op: NodeOp,
    pub operands: Operands,
}

/// A node stored in the cache arena. Never mutated after insertion.
#[derive(Debug)]
pub struct Node<T> {
    pub(crate) body: NodeBody<T>,
    pub(crate) shape: Vec<usize>,
}

#[derive(Debug)]
pub(crate) enum NodeBody<T> {
    Leaf(Rc<T>),
    Op(NodeKey),
}

impl<T> Node<T> {
    pub(crate) fn leaf(tensor: Rc<T>, shape: Vec<usize>) -> Self {
        Self {
            body: NodeBody::Leaf(tensor),
            shape,
        }
    }

    pub(crate) fn op(key: NodeKey, shape: Vec<usize>) -> Self {
        Self {
            body: NodeBody::Op(key),
            shape,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match &self.body {
            NodeBody::Leaf(_) => NodeKind::Leaf,
            NodeBody::Op(key) => key.op.kind(),
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.body, NodeBody::Leaf(_))
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Operand ids, empty for leaves.
    pub fn operands(&self) -> &[NodeId] {
        match &self.body {
            NodeBody::Leaf(_) => &[],
            NodeBody::Op(key) => &key.operands,
        }
    }

    /// The content key, `None` for leaves.
    pub fn key(&self) -> Option<&NodeKey> {
        match &self.body {
            NodeBody::Leaf(_) => None,
            NodeBody::Op(key) => Some(key),
        }
    }
}

/// Address used as the identity of a leaf tensor.
#[inline]
pub(crate) fn leaf_identity<T>(tensor: &Rc<T>) -> usize {
    Rc::as_ptr(tensor) as *const () as usize
}

/// Shape of an operation's result from its operands' shapes.
///
/// A label takes its largest size, so size-1 axes broadcast. Other
/// conflicts surface when the backend runs the step.
pub(crate) fn result_shape(equation: &EquationFragment, operand_shapes: &[&[usize]]) -> Vec<usize> {
    equation
        .output
        .iter()
        .map(|c| {
            equation
                .inputs
                .iter()
                .zip(operand_shapes)
                .flat_map(|(labels, shape)| {
                    labels.iter().zip(shape.iter()).filter(|(l, _)| *l == c).map(|(_, &d)| d)
                })
                .max()
                .unwrap_or(1)
        })
        .collect()
}
