//! # Deferred Einsum
//!
//! Lazy, expression-sharing evaluation of Einstein summations.
//!
//! A multi-operand contraction is split by a path optimizer into pairwise
//! steps. Instead of running them, each step becomes a node in a
//! content-addressed cache, so structurally identical sub-expressions built
//! inside one sharing scope collapse to a single node. Numbers are computed
//! only when a handle is evaluated, and every distinct node at most once.
//!
//! ## Features
//!
//! - Einsum notation parsing with implicit output, ellipsis and an extended
//!   Unicode label alphabet
//! - Greedy and dynamic-programming contraction paths
//! - Tensordot detection for pure pairwise contractions
//! - Nested sharing scopes, shared or isolated, with debug statistics
//! - Pluggable backends, with an `ndarray` reference backend
//!
//! ## Example
//!
//! ```ignore
//! use deferred_einsum::{CpuBackend, Execution, SharingContext};
//!
//! let ctx = SharingContext::new(CpuBackend::<f64>::new());
//! let scope = ctx.enter_scope();
//! let x = ctx.wrap_as_deferred(&x);
//! let y = ctx.wrap_as_deferred(&y);
//! let z = ctx.wrap_as_deferred(&z);
//!
//! let first = ctx.contract("ab,bc,cd->a", &[&x, &y, &z], Execution::Deferred)?;
//! let second = ctx.contract("ab,bc,cd->d", &[&x, &y, &z], Execution::Deferred)?;
//! // Steps common to both results are built and computed once.
//! let a = first.evaluate()?;
//! let d = second.evaluate()?;
//! ```

pub mod backend;
pub mod deferred;
pub mod error;
pub mod launch;
pub mod notation;
pub mod optimization;
pub mod pattern;

pub use backend::{Backend, CpuBackend, EquationFragment};
pub use deferred::{CacheHandle, CacheStats, Deferred, ExpressionCache, NodeId, NodeKind};
pub use error::{BackendError, EinsumError, EinsumResult, EquationError};
pub use launch::{EinsumConfig, Execution, ScopeGuard, ScopeStats, SharingContext};
pub use notation::{get_symbol, parse_einsum, EinsumNotation, Subscript};
pub use optimization::{ContractionPath, ContractionStrategy, CostModel, PathOptimizer};
pub use pattern::{StepPattern, TensordotAxes};
