//! The mutable target slot read by every tick.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Shared cell holding the identifier the controller currently refreshes.
///
/// Writers replace the value wholesale; the tick routine clones it out.
/// `None` means no target is set and ticks are skipped.
pub struct TargetSlot<T> {
    inner: Arc<RwLock<Option<T>>>,
}

impl<T> TargetSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_target(target: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(target))),
        }
    }

    /// Replace the stored target unconditionally.
    pub fn set(&self, target: T) {
        *self.inner.write() = Some(target);
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    pub fn is_set(&self) -> bool {
        self.inner.read().is_some()
    }
}

impl<T: Clone> TargetSlot<T> {
    /// Snapshot of the current target.
    pub fn get(&self) -> Option<T> {
        self.inner.read().clone()
    }
}

impl<T> Clone for TargetSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for TargetSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for TargetSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TargetSlot").field(&*self.inner.read()).finish()
    }
}
