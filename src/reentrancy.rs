//! Debug-only reentrancy guard.
//!
//! The structural layers (`ProbeTable`, `AvlTree`) call user `Eq`, `Hash`
//! and `Ord` implementations while probing or descending. A user impl that
//! reaches back into the same structure would observe it mid-operation, so
//! in debug builds entering twice panics with the name of the structure. In
//! release builds the tracker is a zero-sized no-op.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-instance reentrancy tracker. Structural methods start with
/// `let _g = self.reentrancy.enter();`.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    depth: Cell<u32>,
    #[cfg(debug_assertions)]
    owner: &'static str,
    // Single-threaded: keep !Send + !Sync.
    _nosend: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    #[allow(unused_variables)]
    pub(crate) const fn new(owner: &'static str) -> Self {
        Self {
            #[cfg(debug_assertions)]
            depth: Cell::new(0),
            #[cfg(debug_assertions)]
            owner,
            _nosend: PhantomData,
        }
    }

    /// Enter a guarded section. In debug builds, panics if already entered.
    #[inline]
    pub(crate) fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            let d = self.depth.get();
            assert!(d == 0, "reentrancy detected: nested entry into {}", self.owner);
            self.depth.set(d + 1);
            ReentrancyGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ReentrancyGuard { _z: PhantomData }
        }
    }

    /// Whether a guarded section is currently open. Always false in release.
    #[cfg(test)]
    pub(crate) fn is_entered(&self) -> bool {
        #[cfg(debug_assertions)]
        {
            self.depth.get() > 0
        }
        #[cfg(not(debug_assertions))]
        {
            false
        }
    }
}

impl Clone for DebugReentrancy {
    // A clone is a fresh structure; it never inherits an open section.
    fn clone(&self) -> Self {
        #[cfg(debug_assertions)]
        {
            Self::new(self.owner)
        }
        #[cfg(not(debug_assertions))]
        {
            Self::new("")
        }
    }
}

/// RAII guard returned by `DebugReentrancy::enter`.
pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let d = self.owner.depth.get();
            debug_assert!(d > 0);
            self.owner.depth.set(d - 1);
        }
    }
}
