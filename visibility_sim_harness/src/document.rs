// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scriptable host document.

use alloc::borrow::ToOwned;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use visibility_core::VisibilityState;
use visibility_core::host::Document;
use visibility_core::probe::{LogicalName, Prefix};

use crate::clock::SimClock;

/// The event object delivered to listeners of a [`SimDocument`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimEvent {
    /// Number of events the document dispatched before this one.
    pub sequence: u64,
    /// Virtual time of dispatch, in milliseconds.
    pub at: u64,
}

type Listener = Rc<dyn Fn(SimEvent)>;

struct DocState {
    clock: SimClock,
    api: Cell<Option<Prefix>>,
    state: Cell<VisibilityState>,
    dispatched: Cell<u64>,
    listeners: RefCell<Vec<(String, Listener)>>,
}

/// A document exposing the visibility API under one name variant (or not at
/// all), whose state is changed by the test.
///
/// The hidden flag is derived from the state the way browsers do it:
/// anything other than `visible` reads as hidden.
#[derive(Clone)]
pub struct SimDocument(Rc<DocState>);

impl fmt::Debug for SimDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimDocument")
            .field("api", &self.0.api.get())
            .field("state", &self.0.state.get())
            .field("dispatched", &self.0.dispatched.get())
            .field("listeners", &self.0.listeners.borrow().len())
            .finish()
    }
}

impl SimDocument {
    /// Creates a document. `api` is the name variant it exposes, or `None`
    /// for a host without the visibility API.
    #[must_use]
    pub fn new(clock: SimClock, api: Option<Prefix>, state: VisibilityState) -> Self {
        Self(Rc::new(DocState {
            clock,
            api: Cell::new(api),
            state: Cell::new(state),
            dispatched: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }))
    }

    /// Returns the current state.
    #[must_use]
    pub fn current(&self) -> VisibilityState {
        self.0.state.get()
    }

    /// Changes the exposed name variant without dispatching anything.
    pub fn set_api(&self, api: Option<Prefix>) {
        self.0.api.set(api);
    }

    /// Changes the state without dispatching anything.
    pub fn set_state_silently(&self, state: VisibilityState) {
        self.0.state.set(state);
    }

    /// Changes the state and dispatches the change event.
    pub fn set_state(&self, state: VisibilityState) {
        self.set_state_silently(state);
        self.notify();
    }

    /// Dispatches the change event without changing the state.
    ///
    /// Real hosts do this, e.g. on `hidden` → `prerender`, or twice in a row.
    pub fn notify(&self) {
        let Some(api) = self.0.api.get() else {
            return;
        };
        let name = api.resolve(LogicalName::ChangeEvent);
        let event = SimEvent {
            sequence: self.0.dispatched.get(),
            at: self.0.clock.now(),
        };
        self.0.dispatched.set(event.sequence + 1);

        let listeners: Vec<Listener> = self
            .0
            .listeners
            .borrow()
            .iter()
            .filter(|(event_name, _)| *event_name == name)
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    /// Returns the names of all attached listeners, in attach order.
    #[must_use]
    pub fn listener_names(&self) -> Vec<String> {
        self.0
            .listeners
            .borrow()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn is(&self, name: &str, logical: LogicalName) -> bool {
        self.0
            .api
            .get()
            .is_some_and(|api| api.resolve(logical) == name)
    }
}

impl Document for SimDocument {
    type Event = SimEvent;

    fn has_property(&self, name: &str) -> bool {
        self.is(name, LogicalName::Hidden) || self.is(name, LogicalName::VisibilityState)
    }

    fn bool_property(&self, name: &str) -> bool {
        self.is(name, LogicalName::Hidden) && self.current() != VisibilityState::Visible
    }

    fn string_property(&self, name: &str) -> Option<String> {
        self.is(name, LogicalName::VisibilityState)
            .then(|| self.current().as_str().to_owned())
    }

    fn add_event_listener(&self, event: &str, listener: Listener) {
        self.0
            .listeners
            .borrow_mut()
            .push((event.to_owned(), listener));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_only_its_own_variant() {
        let doc = SimDocument::new(SimClock::new(), Some(Prefix::Moz), VisibilityState::Hidden);
        assert!(doc.has_property("mozVisibilityState"));
        assert!(doc.has_property("mozHidden"));
        assert!(!doc.has_property("visibilityState"));
        assert!(doc.bool_property("mozHidden"));
        assert_eq!(doc.string_property("mozVisibilityState").as_deref(), Some("hidden"));
        assert_eq!(doc.string_property("visibilityState"), None);
    }

    #[test]
    fn prerender_reads_as_hidden() {
        let doc = SimDocument::new(
            SimClock::new(),
            Some(Prefix::Unprefixed),
            VisibilityState::Prerender,
        );
        assert!(doc.bool_property("hidden"));
    }

    #[test]
    fn notify_reaches_matching_listeners_only() {
        let doc = SimDocument::new(SimClock::new(), Some(Prefix::Webkit), VisibilityState::Visible);
        let seen = Rc::new(RefCell::new(Vec::new()));
        for name in ["webkitvisibilitychange", "visibilitychange"] {
            let seen = Rc::clone(&seen);
            doc.add_event_listener(
                name,
                Rc::new(move |e: SimEvent| seen.borrow_mut().push((name, e.sequence))),
            );
        }
        doc.set_state(VisibilityState::Hidden);
        doc.notify();
        assert_eq!(
            *seen.borrow(),
            [("webkitvisibilitychange", 0), ("webkitvisibilitychange", 1)]
        );
    }

    #[test]
    fn unsupported_document_dispatches_nothing() {
        let doc = SimDocument::new(SimClock::new(), None, VisibilityState::Visible);
        let hits = Rc::new(Cell::new(0_u32));
        let h = Rc::clone(&hits);
        doc.add_event_listener(
            "visibilitychange",
            Rc::new(move |_: SimEvent| h.set(h.get() + 1)),
        );
        doc.set_state(VisibilityState::Hidden);
        assert_eq!(hits.get(), 0);
        assert!(!doc.has_property("visibilityState"));
    }
}
