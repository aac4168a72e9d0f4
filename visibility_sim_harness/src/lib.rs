// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic simulated host for `visibility_core`.
//!
//! [`SimHost`] pairs a [`SimDocument`] (scriptable visibility state and
//! change dispatch) with a [`SimClock`] (virtual-time repeating timers), so
//! timer cadences and transitions can be checked to the millisecond without
//! a browser.
//!
//! ```rust,ignore
//! let host = SimHost::new(Some(Prefix::Unprefixed), VisibilityState::Visible);
//! let vis = host.visibility();
//! let log = CallLog::new(&host.clock);
//! vis.schedule(Duration(1000), Some(Duration(5000)), log.recorder());
//! host.run(&[(3500, VisibilityState::Hidden)], 9000);
//! assert_eq!(log.times(), [1000, 2000, 3000, 8500]);
//! ```

#![no_std]

extern crate alloc;

mod clock;
mod document;

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

pub use clock::{SimClock, SimIntervalId};
pub use document::{SimDocument, SimEvent};

use visibility_core::probe::Prefix;
use visibility_core::{Config, Visibility, VisibilityState};

/// A [`Visibility`] context over the simulated host.
pub type SimVisibility = Visibility<SimDocument, SimClock>;

/// A simulated document and clock sharing one timeline.
#[derive(Clone, Debug)]
pub struct SimHost {
    /// The virtual clock, also the [`Intervals`](visibility_core::host::Intervals) facility.
    pub clock: SimClock,
    /// The scriptable document.
    pub document: SimDocument,
}

impl SimHost {
    /// Creates a host at t = 0 exposing the API under `api` (or not at all).
    #[must_use]
    pub fn new(api: Option<Prefix>, state: VisibilityState) -> Self {
        let clock = SimClock::new();
        let document = SimDocument::new(clock.clone(), api, state);
        Self { clock, document }
    }

    /// Creates a standards-compliant, visible host.
    #[must_use]
    pub fn visible() -> Self {
        Self::new(Some(Prefix::Unprefixed), VisibilityState::Visible)
    }

    /// Builds a [`Visibility`] context over this host with [`Config::standard`].
    #[must_use]
    pub fn visibility(&self) -> SimVisibility {
        self.visibility_with(Config::standard())
    }

    /// Builds a [`Visibility`] context over this host.
    #[must_use]
    pub fn visibility_with(&self, config: Config) -> SimVisibility {
        Visibility::with_config(self.document.clone(), self.clock.clone(), config)
    }

    /// Plays `script` (time-ordered `(t, state)` steps) and then runs the
    /// clock to `until`.
    ///
    /// Timers due at exactly a step's time fire before the step is applied.
    pub fn run(&self, script: &[(u64, VisibilityState)], until: u64) {
        for &(at, state) in script {
            self.clock.advance_to(at);
            self.document.set_state(state);
        }
        self.clock.advance_to(until);
    }
}

/// Records the virtual time of every invocation of a callback.
#[derive(Clone, Debug)]
pub struct CallLog {
    clock: SimClock,
    times: Rc<RefCell<Vec<u64>>>,
}

impl CallLog {
    /// Creates an empty log reading time from `clock`.
    #[must_use]
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            times: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Returns a callback that appends the current time to this log.
    #[must_use]
    pub fn recorder(&self) -> impl Fn() + 'static {
        let log = self.clone();
        move || log.times.borrow_mut().push(log.clock.now())
    }

    /// Returns every recorded time, in call order.
    #[must_use]
    pub fn times(&self) -> Vec<u64> {
        self.times.borrow().clone()
    }

    /// Returns the number of recorded calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.borrow().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.borrow().is_empty()
    }
}
