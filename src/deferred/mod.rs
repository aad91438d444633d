//! Symbolic expression DAG with memoized evaluation.
//!
//! - [`node`]: content-keyed node descriptions
//! - [`ExpressionCache`]: one node per distinct key, values memoized
//! - [`Deferred`]: handle to a node, evaluated on demand

mod cache;
mod evaluate;
mod handle;
pub mod node;

pub use cache::{CacheHandle, CacheStats, ExpressionCache, Lookup};
pub use handle::Deferred;
pub use node::{Node, NodeId, NodeKind};
