// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.

use std::io::{self, Write};

use visibility_core::trace::{
    CallbackFailedEvent, CallbackKind, ChangeEvent, ListenerAttachedEvent, OnceVisibleDrainEvent,
    TimerArmedEvent, TimerDisarmedEvent, TimerStoppedEvent, TimerSuspendedEvent, TraceSink,
};

/// A [`TraceSink`] that writes one line per event.
///
/// Write errors are ignored; diagnostics never interrupt the page.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    out: W,
}

impl<W: Write> core::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink writing to standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            out: Box::new(io::stderr()),
        }
    }

    /// Creates a sink writing to a boxed writer.
    #[must_use]
    pub fn new(out: Box<dyn Write>) -> Self {
        Self { out }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink writing to `out`.
    #[must_use]
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_listener_attached(&mut self, e: &ListenerAttachedEvent) {
        let _ = writeln!(self.out, "[attach] prefix={:?} hidden={}", e.prefix, e.hidden);
    }

    fn on_change(&mut self, e: &ChangeEvent) {
        let _ = writeln!(
            self.out,
            "[change] seq={} state={} hidden={} transition={} callbacks={}",
            e.sequence,
            e.state,
            e.hidden,
            e.is_transition(),
            e.callbacks
        );
    }

    fn on_timer_armed(&mut self, e: &TimerArmedEvent) {
        let _ = writeln!(
            self.out,
            "[timer {}] armed cadence={:?} every={:?}{}",
            e.timer.0,
            e.cadence,
            e.interval,
            if e.immediate { " (ran now)" } else { "" }
        );
    }

    fn on_timer_disarmed(&mut self, e: &TimerDisarmedEvent) {
        let _ = writeln!(self.out, "[timer {}] disarmed", e.timer.0);
    }

    fn on_timer_suspended(&mut self, e: &TimerSuspendedEvent) {
        let _ = writeln!(self.out, "[timer {}] suspended", e.timer.0);
    }

    fn on_timer_stopped(&mut self, e: &TimerStoppedEvent) {
        let _ = writeln!(self.out, "[timer {}] stopped", e.timer.0);
    }

    fn on_once_visible_drain(&mut self, e: &OnceVisibleDrainEvent) {
        let _ = writeln!(self.out, "[visible] drained {} callback(s)", e.count);
    }

    fn on_callback_failed(&mut self, e: &CallbackFailedEvent) {
        let _ = match e.kind {
            CallbackKind::Change(i) => writeln!(self.out, "[panic] change callback #{i}"),
            CallbackKind::OnceVisible(i) => writeln!(self.out, "[panic] visible callback #{i}"),
            CallbackKind::Timer(id) => writeln!(self.out, "[panic] timer {}", id.0),
        };
    }
}
