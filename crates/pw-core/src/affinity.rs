//! Single-thread confinement.
//!
//! All engine state is owned by one designated simulation thread and is never
//! locked.  Instead of synchronising, every public entry point asks its
//! [`ThreadAffinity`] whether the caller is that thread.  Calls from anywhere
//! else are refused: the caller gets a fail-open or no-op result and a
//! warning is logged once per call site.

use std::cell::RefCell;
use std::thread::{self, ThreadId};

use rustc_hash::FxHashSet;

/// Records the owning thread and which call sites have already warned.
#[derive(Debug)]
pub struct ThreadAffinity {
    owner:  ThreadId,
    warned: RefCell<FxHashSet<&'static str>>,
}

impl ThreadAffinity {
    /// Bind to the calling thread.
    pub fn current() -> Self {
        Self {
            owner:  thread::current().id(),
            warned: RefCell::new(FxHashSet::default()),
        }
    }

    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    #[inline]
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// `true` if the caller runs on the owning thread.
    ///
    /// Otherwise logs a warning the first time `site` is seen and returns
    /// `false`; the caller must then return its safe fallback.
    pub fn check(&self, site: &'static str) -> bool {
        if self.is_current() {
            return true;
        }
        if self.warned.borrow_mut().insert(site) {
            tracing::warn!(
                site,
                owner = ?self.owner,
                caller = ?thread::current().id(),
                "parking policy call from outside the simulation thread ignored"
            );
        }
        false
    }

    /// Re-bind to the calling thread, e.g. after the host hands the engine
    /// over to its simulation thread.  Clears the warn-once memory.
    pub fn rebind_to_current(&mut self) {
        self.owner = thread::current().id();
        self.warned.get_mut().clear();
    }

    /// Number of distinct call sites that have been refused so far.
    pub fn warned_sites(&self) -> usize {
        self.warned.borrow().len()
    }
}
