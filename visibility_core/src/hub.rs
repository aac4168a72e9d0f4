// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callback storage for change notifications.
//!
//! [`Hub`] keeps two ordered sequences: change callbacks, which stay
//! registered forever, and one-shot "became visible" callbacks, which are
//! drained the first time the page is visible after they were queued.
//! Dispatch itself happens in [`Visibility`](crate::Visibility); the hub only
//! hands out snapshots so that no borrow is held while callbacks run.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::state::VisibilityState;

/// A handler for change notifications: receives the native event and the
/// state read when the event was processed.
pub type ChangeCallback<E> = Rc<dyn Fn(&E, VisibilityState)>;

/// A handler run once when the page becomes visible.
pub type VisibleCallback = Box<dyn FnOnce()>;

/// Ordered change and one-shot callback sequences.
pub struct Hub<E> {
    change: Vec<ChangeCallback<E>>,
    once_visible: Vec<VisibleCallback>,
}

impl<E> fmt::Debug for Hub<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("change", &self.change.len())
            .field("once_visible", &self.once_visible.len())
            .finish()
    }
}

impl<E> Default for Hub<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Hub<E> {
    /// Creates a hub with no callbacks.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            change: Vec::new(),
            once_visible: Vec::new(),
        }
    }

    /// Appends a change callback. Duplicates are kept.
    pub fn push_change(&mut self, callback: ChangeCallback<E>) {
        self.change.push(callback);
    }

    /// Appends a one-shot visible callback.
    pub fn push_once_visible(&mut self, callback: VisibleCallback) {
        self.once_visible.push(callback);
    }

    /// Returns the change callbacks in registration order.
    ///
    /// Callbacks registered after the snapshot is taken are not part of it.
    #[must_use]
    pub fn change_snapshot(&self) -> Vec<ChangeCallback<E>> {
        self.change.clone()
    }

    /// Takes the one-shot queue, leaving it empty.
    ///
    /// Callbacks queued while the taken batch runs land in the fresh queue
    /// and wait for the next transition to visible.
    #[must_use]
    pub fn take_once_visible(&mut self) -> Vec<VisibleCallback> {
        core::mem::take(&mut self.once_visible)
    }

    /// Returns the number of queued one-shot callbacks.
    #[must_use]
    pub fn once_visible_len(&self) -> usize {
        self.once_visible.len()
    }
}
