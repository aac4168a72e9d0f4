// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for platform integrations.
//!
//! `visibility_core` never touches a browser directly. Everything it needs
//! from the environment goes through two narrow traits:
//!
//! - **[`Document`]**: the object carrying the (possibly vendor-prefixed)
//!   `hidden` and `visibilityState` properties and the change event. The
//!   core asks for properties by their *concrete* name; choosing that name
//!   is the job of the [`probe`](crate::probe).
//!
//! - **[`Intervals`]**: a repeating-timer facility with "start repeating"
//!   and "cancel" operations (`setInterval` / `clearInterval` on the web).
//!
//! # Crate boundaries
//!
//! `visibility_core` owns detection, fan-out and timer bookkeeping. Backend
//! crates (`visibility_backend_web`, the simulated host in
//! `visibility_sim_harness`) implement these traits. Application code
//! constructs a [`Visibility`](crate::Visibility) from a backend and keeps
//! it for the life of the page.

use alloc::rc::Rc;
use alloc::string::String;

use crate::time::Duration;

/// The host object that exposes visibility properties and the change event.
///
/// All names passed to these methods are already resolved for the detected
/// vendor prefix (`webkitHidden`, `mozvisibilitychange`, ...).
pub trait Document {
    /// The native event object delivered with each change notification.
    type Event;

    /// Returns `true` if the document defines a property named `name`.
    ///
    /// This is the only capability check the probe performs; the value
    /// itself is not inspected.
    fn has_property(&self, name: &str) -> bool;

    /// Reads a boolean-like property. Missing or non-boolean values read as
    /// `false`.
    fn bool_property(&self, name: &str) -> bool;

    /// Reads a string property, or `None` if it is missing or not a string.
    fn string_property(&self, name: &str) -> Option<String>;

    /// Subscribes `listener` to the event named `event`.
    ///
    /// The subscription lives as long as the document; there is no matching
    /// removal because the core attaches exactly one listener, once.
    ///
    /// Hosts may invoke the listener again while it is running, e.g. when a
    /// change callback causes another notification to be dispatched.
    fn add_event_listener(&self, event: &str, listener: Rc<dyn Fn(Self::Event)>);
}

/// A host repeating-timer facility.
///
/// Implementations must not invoke `callback` synchronously from
/// [`start_repeating`](Self::start_repeating); the first invocation happens
/// one `interval` later.
pub trait Intervals {
    /// Opaque handle identifying one active repeating invocation.
    type Handle;

    /// Invokes `callback` every `interval` until the returned handle is
    /// passed to [`cancel`](Self::cancel).
    fn start_repeating(&self, interval: Duration, callback: Rc<dyn Fn()>) -> Self::Handle;

    /// Cancels a repeating invocation. Once this returns, the callback is
    /// never invoked again through this handle.
    fn cancel(&self, handle: Self::Handle);
}
