//! Error types for deferred einsum operations.
//!
//! Two families: [`EquationError`] is structural and reported when a
//! contraction is built, [`BackendError`] comes from the numeric backend and is
//! reported when a node is evaluated.

/// Errors in an einsum equation or in how it is applied to operands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EquationError {
    /// Invalid einsum notation syntax.
    #[error("parse error: {message}")]
    ParseError { message: String },

    /// Index appears in output but not in any input.
    #[error("output index '{index}' not found in any input")]
    OutputIndexNotInInputs { index: char },

    /// Index appears more than once in the output.
    #[error("output index '{index}' appears more than once")]
    DuplicateOutputIndex { index: char },

    /// Inconsistent ellipsis usage.
    #[error("inconsistent ellipsis: {message}")]
    InconsistentEllipsis { message: String },

    /// A subscript does not match the rank of its operand.
    #[error("dimension mismatch: subscript '{subscript}' expects {expected} dims, tensor has {got}")]
    DimensionMismatch {
        subscript: String,
        expected: usize,
        got: usize,
    },

    /// Number of operands differs from the number of input subscripts.
    #[error("equation has {expected} inputs, got {got} operands")]
    OperandCount { expected: usize, got: usize },

    /// No inputs provided.
    #[error("at least one input tensor is required")]
    NoInputs,

    /// The path optimizer emitted a step referring to a missing operand.
    #[error("contraction step {step} refers to operand {position}, only {available} available")]
    InvalidStep {
        step: usize,
        position: usize,
        available: usize,
    },

    /// A node id that the cache never issued.
    #[error("node {node} does not belong to this cache ({len} nodes)")]
    UnknownNode { node: usize, len: usize },

    /// The path optimizer left more than one operand unreduced.
    #[error("contraction path leaves {remaining} operands, expected 1")]
    IncompletePath { remaining: usize },
}

impl EquationError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }
}

/// Errors raised by a tensor backend while executing a node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// A label is bound to different sizes by different operands.
    #[error("shape mismatch for index '{index}': expected {expected}, got {got}")]
    ShapeMismatch {
        index: char,
        expected: usize,
        got: usize,
    },

    /// A tensor's rank does not match its subscript.
    #[error("rank mismatch: subscript '{subscript}' expects {expected} dims, tensor has {got}")]
    RankMismatch {
        subscript: String,
        expected: usize,
        got: usize,
    },

    /// Tensordot axes are out of range or mismatched.
    #[error("invalid tensordot axes: {message}")]
    InvalidAxes { message: String },

    /// Any other failure inside the backend.
    #[error("backend failure: {message}")]
    Failure { message: String },
}

impl BackendError {
    pub fn shape(index: char, expected: usize, got: usize) -> Self {
        Self::ShapeMismatch {
            index,
            expected,
            got,
        }
    }

    pub fn axes(message: impl Into<String>) -> Self {
        Self::InvalidAxes {
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }
}

/// Errors that can occur while building or evaluating deferred contractions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EinsumError {
    #[error(transparent)]
    Equation(#[from] EquationError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl EinsumError {
    /// Returns true if this error was raised while building a contraction.
    pub fn is_equation_error(&self) -> bool {
        matches!(self, Self::Equation(_))
    }

    /// Returns true if this error was raised by the numeric backend.
    pub fn is_backend_error(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}

/// Result type for einsum operations.
pub type EinsumResult<T> = core::result::Result<T, EinsumError>;

/// Result type for backend operations.
pub type BackendResult<T> = core::result::Result<T, BackendError>;

/// Result type for equation parsing and validation.
pub type EquationResult<T> = core::result::Result<T, EquationError>;
