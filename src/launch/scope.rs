//! Sharing scopes.
//!
//! A [`SharingContext`] owns a stack of scope frames, each pointing at an
//! [`ExpressionCache`](crate::deferred::ExpressionCache). Contractions always
//! build into the innermost frame's cache. Frames are pushed by entering a
//! scope and popped when the returned [`ScopeGuard`] is dropped.

use core::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, warn};

use super::config::EinsumConfig;
use crate::backend::Backend;
use crate::deferred::{CacheHandle, Deferred, Lookup};

/// Node counts recorded by a debug scope.
///
/// Only activity while the scope is innermost is counted; work done in a
/// nested scope sharing the same cache is reported by the nested guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScopeStats {
    /// Leaf nodes created by wrapping tensors.
    pub leaves: usize,
    /// Operation nodes created.
    pub constructed: usize,
    /// Operation nodes found already present.
    pub reused: usize,
}

struct ScopeFrame<B: Backend> {
    serial: u64,
    cache: CacheHandle<B>,
    stats: Option<Rc<Cell<ScopeStats>>>,
    /// Debug flag of the cache before this frame switched it on.
    restore_debug: bool,
}

/// Entry point for deferred contractions over one backend.
pub struct SharingContext<B: Backend> {
    backend: Rc<B>,
    config: EinsumConfig,
    scopes: RefCell<Vec<ScopeFrame<B>>>,
    next_serial: Cell<u64>,
}

impl<B: Backend> SharingContext<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, EinsumConfig::default())
    }

    pub fn with_config(backend: B, config: EinsumConfig) -> Self {
        Self {
            backend: Rc::new(backend),
            config,
            scopes: RefCell::new(Vec::new()),
            next_serial: Cell::new(0),
        }
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn config(&self) -> &EinsumConfig {
        &self.config
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.scopes.borrow().len()
    }

    /// Cache of the innermost open scope.
    pub fn active_cache(&self) -> Option<CacheHandle<B>> {
        self.scopes.borrow().last().map(|frame| frame.cache.clone())
    }

    /// Opens a scope with the configured nesting and debug defaults.
    pub fn enter_scope(&self) -> ScopeGuard<'_, B> {
        self.enter_sharing_scope(self.config.share_nested_scopes, self.config.debug)
    }

    /// Opens a scope.
    ///
    /// With `shared` and an open parent scope, the new scope builds into the
    /// parent's cache; otherwise it starts an empty cache, invisible to every
    /// other scope. With `debug`, the guard records [`ScopeStats`] and node
    /// activity is logged at trace level.
    pub fn enter_sharing_scope(&self, shared: bool, debug: bool) -> ScopeGuard<'_, B> {
        let parent = if shared { self.active_cache() } else { None };
        let cache = parent.unwrap_or_default();
        self.push_frame(cache, debug)
    }

    /// Opens a scope over an existing cache, typically one taken from an
    /// earlier guard with [`ScopeGuard::cache`].
    pub fn resume_scope(&self, cache: &CacheHandle<B>, debug: bool) -> ScopeGuard<'_, B> {
        self.push_frame(cache.clone(), debug)
    }

    fn push_frame(&self, cache: CacheHandle<B>, debug: bool) -> ScopeGuard<'_, B> {
        let serial = self.next_serial.get();
        self.next_serial.set(serial + 1);

        let restore_debug = cache.debug();
        if debug {
            cache.set_debug(true);
        }
        let stats = debug.then(|| Rc::new(Cell::new(ScopeStats::default())));

        let mut scopes = self.scopes.borrow_mut();
        scopes.push(ScopeFrame {
            serial,
            cache: cache.clone(),
            stats: stats.clone(),
            restore_debug,
        });
        let depth = scopes.len();
        debug!("enter scope {serial} at depth {depth} ({} cached nodes)", cache.len());

        ScopeGuard {
            context: self,
            serial,
            depth,
            cache,
            stats,
        }
    }

    /// Cache new nodes go into: the innermost scope's, or a private fresh
    /// one when no scope is open.
    pub(crate) fn working_cache(&self) -> CacheHandle<B> {
        self.active_cache().unwrap_or_default()
    }

    /// Counts a lookup against the innermost debug scope.
    pub(crate) fn record(&self, lookup: Lookup, leaf: bool) {
        let scopes = self.scopes.borrow();
        let Some(stats) = scopes.last().and_then(|frame| frame.stats.as_ref()) else {
            return;
        };
        let mut current = stats.get();
        match (leaf, lookup) {
            (true, Lookup::Constructed(_)) => current.leaves += 1,
            (true, Lookup::Reused(_)) => {}
            (false, Lookup::Constructed(_)) => current.constructed += 1,
            (false, Lookup::Reused(_)) => current.reused += 1,
        }
        stats.set(current);
    }

    /// Wraps a tensor as a leaf of the innermost scope's cache.
    ///
    /// Wrapping the same `Rc` again in that cache returns the same leaf.
    /// Without an open scope the leaf lives in a private cache of its own.
    pub fn wrap_as_deferred(&self, tensor: &Rc<B::Tensor>) -> Deferred<B> {
        let cache = self.working_cache();
        let shape = self.backend.shape(tensor);
        let lookup = cache.borrow_mut().make_leaf(tensor, shape);
        self.record(lookup, true);
        Deferred::new(lookup.id(), cache, Rc::clone(&self.backend))
    }

    pub(crate) fn backend_rc(&self) -> Rc<B> {
        Rc::clone(&self.backend)
    }
}

/// Keeps a scope open; dropping it closes the scope.
///
/// Dropping a guard also closes any scope opened after it that is still
/// open, so the stack stays consistent when guards are dropped out of order.
pub struct ScopeGuard<'a, B: Backend> {
    context: &'a SharingContext<B>,
    serial: u64,
    depth: usize,
    cache: CacheHandle<B>,
    stats: Option<Rc<Cell<ScopeStats>>>,
}

impl<B: Backend> ScopeGuard<'_, B> {
    /// Handle to this scope's cache, usable after the scope closes.
    pub fn cache(&self) -> CacheHandle<B> {
        self.cache.clone()
    }

    /// Statistics of a debug scope, `None` otherwise.
    pub fn stats(&self) -> Option<ScopeStats> {
        self.stats.as_ref().map(|stats| stats.get())
    }

    /// Position of this scope in the stack, starting at 1.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl<B: Backend> Drop for ScopeGuard<'_, B> {
    fn drop(&mut self) {
        let mut scopes = self.context.scopes.borrow_mut();
        let Some(position) = scopes.iter().position(|frame| frame.serial == self.serial) else {
            return;
        };

        let inner = scopes.len() - position - 1;
        if inner > 0 {
            warn!("scope {} closed with {inner} inner scope(s) still open; closing them too", self.serial);
        }
        for frame in scopes.drain(position..).rev() {
            frame.cache.set_debug(frame.restore_debug);
        }

        match self.stats() {
            Some(stats) => debug!(
                "exit scope {}: {} leaves, {} new, {} reused",
                self.serial, stats.leaves, stats.constructed, stats.reused
            ),
            None => debug!("exit scope {}", self.serial),
        }
    }
}
