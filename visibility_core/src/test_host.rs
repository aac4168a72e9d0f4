// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal in-crate host doubles for unit tests.
//!
//! The full deterministic simulation (virtual clock, scripted transitions)
//! lives in `visibility_sim_harness`; these fakes only record calls.

use alloc::borrow::ToOwned;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::host::{Document, Intervals};
use crate::time::Duration;

type Listener = Rc<dyn Fn(u32)>;

#[derive(Default)]
struct DocInner {
    present: RefCell<Vec<String>>,
    values: RefCell<BTreeMap<String, String>>,
    lookups: Cell<usize>,
    listeners: RefCell<Vec<(String, Listener)>>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeDocument(Rc<DocInner>);

impl FakeDocument {
    pub(crate) fn new(present: &[&str]) -> Self {
        let doc = Self::default();
        doc.set_properties(present);
        doc
    }

    /// A document exposing the unprefixed API in the given state.
    pub(crate) fn standard(hidden: bool) -> Self {
        let doc = Self::new(&["visibilityState", "hidden"]);
        doc.set_hidden(hidden);
        doc
    }

    pub(crate) fn set_properties(&self, present: &[&str]) {
        *self.0.present.borrow_mut() = present.iter().map(|&p| p.to_owned()).collect();
    }

    pub(crate) fn set_value(&self, name: &str, value: &str) {
        self.0
            .values
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
    }

    pub(crate) fn set_hidden(&self, hidden: bool) {
        self.set_value("hidden", if hidden { "true" } else { "false" });
        self.set_value("visibilityState", if hidden { "hidden" } else { "visible" });
    }

    pub(crate) fn lookups(&self) -> usize {
        self.0.lookups.get()
    }

    pub(crate) fn listener_names(&self) -> Vec<String> {
        self.0
            .listeners
            .borrow()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Delivers `event` to every attached listener.
    pub(crate) fn fire(&self, event: u32) {
        let listeners: Vec<Listener> = self
            .0
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }
}

impl Document for FakeDocument {
    type Event = u32;

    fn has_property(&self, name: &str) -> bool {
        self.0.lookups.set(self.0.lookups.get() + 1);
        self.0.present.borrow().iter().any(|p| p == name)
    }

    fn bool_property(&self, name: &str) -> bool {
        self.0.values.borrow().get(name).is_some_and(|v| v == "true")
    }

    fn string_property(&self, name: &str) -> Option<String> {
        self.0.values.borrow().get(name).cloned()
    }

    fn add_event_listener(&self, event: &str, listener: Listener) {
        self.0
            .listeners
            .borrow_mut()
            .push((event.to_owned(), listener));
    }
}

struct Slot {
    interval: Duration,
    callback: Rc<dyn Fn()>,
    active: bool,
}

#[derive(Clone, Default)]
pub(crate) struct FakeIntervals(Rc<RefCell<Vec<Slot>>>);

impl FakeIntervals {
    /// Intervals of every still-active repeating invocation, by handle.
    pub(crate) fn active(&self) -> Vec<(usize, Duration)> {
        self.0
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(handle, slot)| (handle, slot.interval))
            .collect()
    }

    pub(crate) fn started(&self) -> usize {
        self.0.borrow().len()
    }

    /// Runs one repeat of every active invocation.
    pub(crate) fn fire_all(&self) {
        let callbacks: Vec<_> = self
            .0
            .borrow()
            .iter()
            .filter(|slot| slot.active)
            .map(|slot| Rc::clone(&slot.callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }
}

impl Intervals for FakeIntervals {
    type Handle = usize;

    fn start_repeating(&self, interval: Duration, callback: Rc<dyn Fn()>) -> usize {
        let mut slots = self.0.borrow_mut();
        slots.push(Slot {
            interval,
            callback,
            active: true,
        });
        slots.len() - 1
    }

    fn cancel(&self, handle: usize) {
        if let Some(slot) = self.0.borrow_mut().get_mut(handle) {
            slot.active = false;
        }
    }
}
