// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for visibility handling.
//!
//! This module provides a [`TraceSink`] trait with one method per event.
//! All method bodies default to no-ops, so implementing only the events you
//! care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Install a sink with
//! [`Visibility::set_trace_sink`](crate::Visibility::set_trace_sink). Because
//! [`TraceSink`] is implemented for `Rc<RefCell<T>>`, you can keep a clone of
//! the sink to inspect it later.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use alloc::rc::Rc;
use core::cell::RefCell;

use crate::probe::Prefix;
use crate::state::VisibilityState;
use crate::time::Duration;
use crate::timer::{Cadence, TimerId};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the host change listener is attached (once per context).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerAttachedEvent {
    /// Name variant the listener was attached under.
    pub prefix: Prefix,
    /// Hidden flag read at attach time; becomes the transition baseline.
    pub hidden: bool,
}

/// Emitted for every processed change notification, after callbacks ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Monotonic count of processed notifications, starting at 0.
    pub sequence: u64,
    /// State read at the start of processing.
    pub state: VisibilityState,
    /// Hidden flag read at the start of processing.
    pub hidden: bool,
    /// Hidden flag from the previous notification (or attach).
    pub was_hidden: bool,
    /// Number of change callbacks invoked.
    pub callbacks: u32,
}

impl ChangeEvent {
    /// Returns `true` if the hidden flag actually flipped.
    #[must_use]
    pub const fn is_transition(&self) -> bool {
        self.hidden != self.was_hidden
    }
}

/// Emitted when a timer gets a new active repeating invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerArmedEvent {
    /// The timer.
    pub timer: TimerId,
    /// Which cadence applies.
    pub cadence: Cadence,
    /// Interval handed to the host, after the configured floor.
    pub interval: Duration,
    /// Whether the callback also ran once immediately.
    pub immediate: bool,
}

/// Emitted when a timer's active invocation is cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerDisarmedEvent {
    /// The timer.
    pub timer: TimerId,
}

/// Emitted when a timer is left inert because the page is hidden and it has
/// no hidden cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerSuspendedEvent {
    /// The timer.
    pub timer: TimerId,
}

/// Emitted when a timer is removed from the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerStoppedEvent {
    /// The timer.
    pub timer: TimerId,
}

/// Emitted when the one-shot visible queue is drained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OnceVisibleDrainEvent {
    /// Number of callbacks invoked.
    pub count: u32,
}

/// Which kind of user callback failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    /// A change callback, by registration index.
    Change(u32),
    /// A one-shot visible callback, by position in the drained batch.
    OnceVisible(u32),
    /// The immediate run of a timer on a transition to visible.
    Timer(TimerId),
}

/// Emitted when a user callback panics and the panic is contained
/// (requires the `std` feature for containment).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallbackFailedEvent {
    /// The callback that failed.
    pub kind: CallbackKind,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a [`Visibility`](crate::Visibility) context.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about. Sinks must not call back into the
/// context that emits to them.
pub trait TraceSink {
    /// Called when the host listener is attached.
    fn on_listener_attached(&mut self, e: &ListenerAttachedEvent) {
        _ = e;
    }

    /// Called after a change notification was fanned out.
    fn on_change(&mut self, e: &ChangeEvent) {
        _ = e;
    }

    /// Called when a timer is armed.
    fn on_timer_armed(&mut self, e: &TimerArmedEvent) {
        _ = e;
    }

    /// Called when a timer's invocation is cancelled.
    fn on_timer_disarmed(&mut self, e: &TimerDisarmedEvent) {
        _ = e;
    }

    /// Called when a timer is left inert while hidden.
    fn on_timer_suspended(&mut self, e: &TimerSuspendedEvent) {
        _ = e;
    }

    /// Called when a timer is removed.
    fn on_timer_stopped(&mut self, e: &TimerStoppedEvent) {
        _ = e;
    }

    /// Called when the one-shot queue is drained.
    fn on_once_visible_drain(&mut self, e: &OnceVisibleDrainEvent) {
        _ = e;
    }

    /// Called when a user callback panicked.
    fn on_callback_failed(&mut self, e: &CallbackFailedEvent) {
        _ = e;
    }
}

impl<T: TraceSink + ?Sized> TraceSink for Rc<RefCell<T>> {
    fn on_listener_attached(&mut self, e: &ListenerAttachedEvent) {
        self.borrow_mut().on_listener_attached(e);
    }

    fn on_change(&mut self, e: &ChangeEvent) {
        self.borrow_mut().on_change(e);
    }

    fn on_timer_armed(&mut self, e: &TimerArmedEvent) {
        self.borrow_mut().on_timer_armed(e);
    }

    fn on_timer_disarmed(&mut self, e: &TimerDisarmedEvent) {
        self.borrow_mut().on_timer_disarmed(e);
    }

    fn on_timer_suspended(&mut self, e: &TimerSuspendedEvent) {
        self.borrow_mut().on_timer_suspended(e);
    }

    fn on_timer_stopped(&mut self, e: &TimerStoppedEvent) {
        self.borrow_mut().on_timer_stopped(e);
    }

    fn on_once_visible_drain(&mut self, e: &OnceVisibleDrainEvent) {
        self.borrow_mut().on_once_visible_drain(e);
    }

    fn on_callback_failed(&mut self, e: &CallbackFailedEvent) {
        self.borrow_mut().on_callback_failed(e);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! emit {
    ($self:ident, $method:ident, $e:expr) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    }};
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`ListenerAttachedEvent`].
    #[inline]
    pub fn listener_attached(&mut self, e: &ListenerAttachedEvent) {
        emit!(self, on_listener_attached, e);
    }

    /// Emits a [`ChangeEvent`].
    #[inline]
    pub fn change(&mut self, e: &ChangeEvent) {
        emit!(self, on_change, e);
    }

    /// Emits a [`TimerArmedEvent`].
    #[inline]
    pub fn timer_armed(&mut self, e: &TimerArmedEvent) {
        emit!(self, on_timer_armed, e);
    }

    /// Emits a [`TimerDisarmedEvent`].
    #[inline]
    pub fn timer_disarmed(&mut self, e: &TimerDisarmedEvent) {
        emit!(self, on_timer_disarmed, e);
    }

    /// Emits a [`TimerSuspendedEvent`].
    #[inline]
    pub fn timer_suspended(&mut self, e: &TimerSuspendedEvent) {
        emit!(self, on_timer_suspended, e);
    }

    /// Emits a [`TimerStoppedEvent`].
    #[inline]
    pub fn timer_stopped(&mut self, e: &TimerStoppedEvent) {
        emit!(self, on_timer_stopped, e);
    }

    /// Emits an [`OnceVisibleDrainEvent`].
    #[inline]
    pub fn once_visible_drain(&mut self, e: &OnceVisibleDrainEvent) {
        emit!(self, on_once_visible_drain, e);
    }

    /// Emits a [`CallbackFailedEvent`].
    #[inline]
    pub fn callback_failed(&mut self, e: &CallbackFailedEvent) {
        emit!(self, on_callback_failed, e);
    }
}
