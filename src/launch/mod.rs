//! Launch module for deferred einsum operations.
//!
//! Provides the caller-facing API: sharing scopes, leaf wrapping and the
//! contraction driver.

mod config;
mod driver;
mod scope;

pub use config::EinsumConfig;
pub use driver::Execution;
pub use scope::{ScopeGuard, ScopeStats, SharingContext};
