// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Virtual-time repeating-timer facility.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use visibility_core::host::Intervals;
use visibility_core::time::Duration;

/// Handle for one simulated repeating invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimIntervalId(pub u64);

struct Repeat {
    interval: u64,
    next_due: u64,
    callback: Rc<dyn Fn()>,
}

#[derive(Default)]
struct ClockState {
    now: Cell<u64>,
    last_id: Cell<u64>,
    repeats: RefCell<BTreeMap<SimIntervalId, Repeat>>,
}

/// A millisecond clock that only moves when told to.
///
/// Implements [`Intervals`]: repeats fire while [`advance_to`](Self::advance_to)
/// walks time forward, in due-time order, ties broken by creation order.
/// Callbacks run with no internal borrow held, so they may start or cancel
/// repeats (including their own).
#[derive(Clone, Default)]
pub struct SimClock(Rc<ClockState>);

impl fmt::Debug for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimClock")
            .field("now", &self.0.now.get())
            .field("active", &self.0.repeats.borrow().len())
            .finish()
    }
}

impl SimClock {
    /// Creates a clock at t = 0 with nothing scheduled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current virtual time in milliseconds.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.0.now.get()
    }

    /// Returns the number of active repeats.
    #[must_use]
    pub fn active(&self) -> usize {
        self.0.repeats.borrow().len()
    }

    /// Returns the interval of an active repeat.
    #[must_use]
    pub fn interval_of(&self, id: SimIntervalId) -> Option<Duration> {
        self.0
            .repeats
            .borrow()
            .get(&id)
            .map(|r| Duration(r.interval))
    }

    /// Moves time forward by `d`, firing everything due on the way.
    pub fn advance(&self, d: Duration) {
        self.advance_to(self.now().saturating_add(d.as_millis()));
    }

    /// Moves time forward to `target`, firing everything due at or before it.
    ///
    /// Moving backwards is a no-op.
    pub fn advance_to(&self, target: u64) {
        while let Some((id, due)) = self.next_due(target) {
            self.0.now.set(due);
            let callback = {
                let mut repeats = self.0.repeats.borrow_mut();
                let Some(repeat) = repeats.get_mut(&id) else {
                    continue;
                };
                repeat.next_due = due.saturating_add(repeat.interval);
                Rc::clone(&repeat.callback)
            };
            callback();
        }
        if target > self.now() {
            self.0.now.set(target);
        }
    }

    fn next_due(&self, target: u64) -> Option<(SimIntervalId, u64)> {
        self.0
            .repeats
            .borrow()
            .iter()
            .map(|(&id, r)| (id, r.next_due))
            .filter(|&(_, due)| due <= target)
            .min_by_key(|&(id, due)| (due, id))
    }
}

impl Intervals for SimClock {
    type Handle = SimIntervalId;

    fn start_repeating(&self, interval: Duration, callback: Rc<dyn Fn()>) -> SimIntervalId {
        // A zero period would never let virtual time advance.
        let interval = interval.as_millis().max(1);
        let id = SimIntervalId(self.0.last_id.get() + 1);
        self.0.last_id.set(id.0);
        self.0.repeats.borrow_mut().insert(
            id,
            Repeat {
                interval,
                next_due: self.now().saturating_add(interval),
                callback,
            },
        );
        id
    }

    fn cancel(&self, handle: SimIntervalId) {
        self.0.repeats.borrow_mut().remove(&handle);
    }
}
