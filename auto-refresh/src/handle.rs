//! Cloneable target setter for host UI code.

use std::fmt;

use crate::target::TargetSlot;

/// Handle for changing what an [`AutoRefresh`](crate::AutoRefresh) polls.
///
/// Handles are cheap to clone and can be moved into UI callbacks (a search
/// box selecting a customer, an invoice list selecting a row). They do not
/// keep the timer alive: once the controller is stopped or dropped, writes
/// through a handle have no effect on any fetch.
pub struct RefreshHandle<T> {
    target: TargetSlot<T>,
}

impl<T> RefreshHandle<T> {
    pub(crate) fn new(target: TargetSlot<T>) -> Self {
        Self { target }
    }

    pub fn set_target(&self, target: T) {
        self.target.set(target);
    }

    pub fn clear_target(&self) {
        self.target.clear();
    }
}

impl<T: Clone> RefreshHandle<T> {
    pub fn target(&self) -> Option<T> {
        self.target.get()
    }
}

impl<T> Clone for RefreshHandle<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for RefreshHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshHandle")
            .field("target", &self.target)
            .finish()
    }
}
