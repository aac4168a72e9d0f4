// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registry of visibility-aware recurring timers.
//!
//! [`TimerRegistry`] is pure bookkeeping: it allocates ids, stores each
//! [`Timer`] with the handle of its active repeating invocation, and decides
//! which cadence applies for a given hidden flag. Talking to the host
//! [`Intervals`](crate::host::Intervals) facility and invoking callbacks is
//! left to [`Visibility`](crate::Visibility), which never holds the registry
//! borrowed while user code runs.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::time::Duration;

/// Identifier returned by [`Visibility::schedule`](crate::Visibility::schedule).
///
/// Ids start at 1, strictly increase, and are never reused, even after the
/// timer is stopped. They are unrelated to host interval ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

/// Which of a timer's two cadences is in effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cadence {
    /// The page is visible; the visible interval applies.
    Visible,
    /// The page is hidden; the hidden interval applies.
    Hidden,
}

/// A recurring job with a visible cadence and an optional hidden cadence.
#[derive(Clone)]
pub struct Timer {
    id: TimerId,
    visible_interval: Duration,
    hidden_interval: Option<Duration>,
    callback: Rc<dyn Fn()>,
}

impl Timer {
    /// Returns the timer's id.
    #[must_use]
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Returns the cadence used while the page is visible.
    #[must_use]
    pub fn visible_interval(&self) -> Duration {
        self.visible_interval
    }

    /// Returns the cadence used while the page is hidden, or `None` if the
    /// timer is suspended while hidden.
    #[must_use]
    pub fn hidden_interval(&self) -> Option<Duration> {
        self.hidden_interval
    }

    /// Returns the job.
    #[must_use]
    pub fn callback(&self) -> &Rc<dyn Fn()> {
        &self.callback
    }

    /// Returns the cadence and interval to run at for the given hidden flag,
    /// or `None` if the timer must stay inert.
    #[must_use]
    pub fn cadence_for(&self, hidden: bool) -> Option<(Cadence, Duration)> {
        if hidden {
            self.hidden_interval.map(|i| (Cadence::Hidden, i))
        } else {
            Some((Cadence::Visible, self.visible_interval))
        }
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("visible_interval", &self.visible_interval)
            .field("hidden_interval", &self.hidden_interval)
            .finish_non_exhaustive()
    }
}

struct Entry<H> {
    timer: Timer,
    running: Option<H>,
}

/// Timer records keyed by id, each with at most one running handle.
pub struct TimerRegistry<H> {
    last_id: u64,
    entries: BTreeMap<TimerId, Entry<H>>,
}

impl<H> fmt::Debug for TimerRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerRegistry")
            .field("last_id", &self.last_id)
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<H> Default for TimerRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> TimerRegistry<H> {
    /// Creates an empty registry. The first id handed out is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_id: 0,
            entries: BTreeMap::new(),
        }
    }

    /// Stores a new, not yet running timer and returns its id.
    pub fn insert(
        &mut self,
        visible_interval: Duration,
        hidden_interval: Option<Duration>,
        callback: Rc<dyn Fn()>,
    ) -> TimerId {
        self.last_id += 1;
        let id = TimerId(self.last_id);
        self.entries.insert(
            id,
            Entry {
                timer: Timer {
                    id,
                    visible_interval,
                    hidden_interval,
                    callback,
                },
                running: None,
            },
        );
        id
    }

    /// Returns the timer with the given id.
    #[must_use]
    pub fn get(&self, id: TimerId) -> Option<&Timer> {
        self.entries.get(&id).map(|e| &e.timer)
    }

    /// Returns `true` if the timer exists and has an active invocation.
    #[must_use]
    pub fn is_running(&self, id: TimerId) -> bool {
        self.entries.get(&id).is_some_and(|e| e.running.is_some())
    }

    /// Returns the ids of every registered timer, ascending.
    #[must_use]
    pub fn ids(&self) -> Vec<TimerId> {
        self.entries.keys().copied().collect()
    }

    /// Returns the number of registered timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no timers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Detaches and returns the running handle, leaving the record in place.
    pub fn take_running(&mut self, id: TimerId) -> Option<H> {
        self.entries.get_mut(&id)?.running.take()
    }

    /// Records `handle` as the timer's active invocation.
    ///
    /// Fails, handing the handle back, if the timer no longer exists or
    /// already has an active invocation; the caller must cancel it.
    pub fn set_running(&mut self, id: TimerId, handle: H) -> Result<(), H> {
        match self.entries.get_mut(&id) {
            Some(entry) if entry.running.is_none() => {
                entry.running = Some(handle);
                Ok(())
            }
            _ => Err(handle),
        }
    }

    /// Removes a timer, returning its record and running handle.
    pub fn remove(&mut self, id: TimerId) -> Option<(Timer, Option<H>)> {
        self.entries.remove(&id).map(|e| (e.timer, e.running))
    }
}
