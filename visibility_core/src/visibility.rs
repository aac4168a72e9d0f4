// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Visibility`] context: public surface and change dispatch.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::config::Config;
use crate::host::{Document, Intervals};
use crate::hub::Hub;
use crate::probe::{LogicalName, Prefix, Probe};
use crate::state::{self, VisibilityState};
use crate::time::Duration;
use crate::timer::{Timer, TimerId, TimerRegistry};
use crate::trace::{
    CallbackKind, ChangeEvent, ListenerAttachedEvent, OnceVisibleDrainEvent, TimerArmedEvent,
    TimerDisarmedEvent, TimerStoppedEvent, TimerSuspendedEvent, TraceSink, Tracer,
};

/// Page visibility state, change notifications, and visibility-aware timers
/// for one host document.
///
/// `Visibility` is a cheap, cloneable handle; clones share state. Construct
/// one at startup and keep it for the life of the page.
///
/// # Change dispatch
///
/// Each host change notification is processed in a fixed order:
///
/// 1. read the current hidden flag and state;
/// 2. invoke every change callback, in registration order;
/// 3. if the hidden flag flipped since the last notification, stop every
///    timer and restart it under the new cadence, running it once
///    immediately when the page became visible;
/// 4. if the page is visible, drain the one-shot queue;
/// 5. remember the hidden flag for the next notification.
///
/// Callbacks may call back into the context, including stopping their own
/// timer. No internal borrow is held while user code runs.
///
/// If a callback causes the host to dispatch another notification, the
/// nested one is processed in full and the outer one stops where it is.
/// A timer whose immediate run hid the page again is re-planned for the
/// hidden cadence.
///
/// # Usage
///
/// ```rust,ignore
/// let vis = Visibility::new(document, intervals);
/// let poll = vis.schedule(
///     Duration::from_secs(1),
///     Some(Duration::from_secs(60)),
///     || refresh_feed(),
/// );
/// vis.on_visible(|| resume_video());
/// // ...
/// vis.stop(poll);
/// ```
pub struct Visibility<D: Document, I: Intervals> {
    inner: Rc<Inner<D, I>>,
}

struct Inner<D: Document, I: Intervals> {
    document: D,
    intervals: I,
    config: Config,
    probe: Probe,
    listening: Cell<bool>,
    hidden_before: Cell<bool>,
    sequence: Cell<u64>,
    hub: RefCell<Hub<D::Event>>,
    timers: RefCell<TimerRegistry<I::Handle>>,
    sink: RefCell<Option<Box<dyn TraceSink>>>,
}

impl<D: Document, I: Intervals> Clone for Visibility<D, I> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: Document, I: Intervals> fmt::Debug for Visibility<D, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Visibility")
            .field("prefix", &self.inner.probe.cached())
            .field("listening", &self.inner.listening.get())
            .field("hidden_before", &self.inner.hidden_before.get())
            .field("hub", &*self.inner.hub.borrow())
            .field("timers", &*self.inner.timers.borrow())
            .finish_non_exhaustive()
    }
}

impl<D, I> Visibility<D, I>
where
    D: Document + 'static,
    I: Intervals + 'static,
{
    /// Creates a context with [`Config::standard`].
    #[must_use]
    pub fn new(document: D, intervals: I) -> Self {
        Self::with_config(document, intervals, Config::standard())
    }

    /// Creates a context with the given configuration.
    ///
    /// The transition baseline is the hidden flag at construction time.
    #[must_use]
    pub fn with_config(document: D, intervals: I, config: Config) -> Self {
        let vis = Self {
            inner: Rc::new(Inner {
                document,
                intervals,
                config,
                probe: Probe::new(config.prefixes),
                listening: Cell::new(false),
                hidden_before: Cell::new(false),
                sequence: Cell::new(0),
                hub: RefCell::new(Hub::new()),
                timers: RefCell::new(TimerRegistry::new()),
                sink: RefCell::new(None),
            }),
        };
        vis.inner.hidden_before.set(vis.hidden());
        vis
    }

    /// Returns the host document.
    #[must_use]
    pub fn document(&self) -> &D {
        &self.inner.document
    }

    /// Returns the host interval facility.
    #[must_use]
    pub fn intervals(&self) -> &I {
        &self.inner.intervals
    }

    /// Returns the configuration this context was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Installs a trace sink, returning the previous one.
    pub fn set_trace_sink(&self, sink: Option<Box<dyn TraceSink>>) -> Option<Box<dyn TraceSink>> {
        core::mem::replace(&mut *self.inner.sink.borrow_mut(), sink)
    }

    // -- State Reader ------------------------------------------------------

    /// Returns `true` if the host exposes a visibility API under any known
    /// name variant.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.prefix().is_some()
    }

    /// Returns the detected name variant, or `None` if unsupported.
    #[must_use]
    pub fn prefix(&self) -> Option<Prefix> {
        self.inner.probe.detect(&self.inner.document)
    }

    /// Returns `true` if the page is hidden. Unsupported hosts read as
    /// visible.
    #[must_use]
    pub fn hidden(&self) -> bool {
        state::hidden(&self.inner.probe, &self.inner.document)
    }

    /// Returns the tri-state visibility label. Unsupported hosts read as
    /// [`VisibilityState::Visible`].
    #[must_use]
    pub fn state(&self) -> VisibilityState {
        state::state(&self.inner.probe, &self.inner.document)
    }

    // -- Notification Hub --------------------------------------------------

    /// Registers `callback` for every change notification.
    ///
    /// Returns `false`, registering nothing, if the host has no visibility
    /// API. Registering the same closure twice runs it twice.
    pub fn on_change<F>(&self, callback: F) -> bool
    where
        F: Fn(&D::Event, VisibilityState) + 'static,
    {
        if !self.is_supported() {
            return false;
        }
        self.inner.hub.borrow_mut().push_change(Rc::new(callback));
        self.ensure_listening();
        true
    }

    /// Runs `callback` once the page is visible.
    ///
    /// If the page is visible now, or the host has no visibility API,
    /// `callback` runs before this returns and the result is `true`.
    /// Otherwise it is queued for the next notification that finds the page
    /// visible, and the result is `false`.
    pub fn on_visible<F>(&self, callback: F) -> bool
    where
        F: FnOnce() + 'static,
    {
        if !self.is_supported() || !self.hidden() {
            callback();
            return true;
        }
        self.inner
            .hub
            .borrow_mut()
            .push_once_visible(Box::new(callback));
        self.ensure_listening();
        false
    }

    /// Processes one host change notification.
    ///
    /// The listener attached by this context calls this; hosts that deliver
    /// events some other way may call it directly.
    pub fn dispatch_change(&self, event: &D::Event) {
        let hidden = self.hidden();
        let state = self.state();
        let was_hidden = self.inner.hidden_before.get();
        let sequence = self.inner.sequence.get();
        self.inner.sequence.set(sequence + 1);

        let callbacks = self.inner.hub.borrow().change_snapshot();
        for (index, callback) in callbacks.iter().enumerate() {
            let kind = CallbackKind::Change(u32::try_from(index).unwrap_or(u32::MAX));
            self.guarded(kind, || callback(event, state));
        }

        self.trace(|t| {
            t.change(&ChangeEvent {
                sequence,
                state,
                hidden,
                was_hidden,
                callbacks: u32::try_from(callbacks.len()).unwrap_or(u32::MAX),
            });
        });

        // A notification dispatched from inside a callback has already
        // processed a newer state; everything below would act on a stale one.
        if self.superseded(sequence) {
            return;
        }

        if hidden != was_hidden {
            let ids = self.inner.timers.borrow().ids();
            for id in ids {
                self.disarm(id);
                self.arm(id, hidden, !hidden);
                if self.superseded(sequence) {
                    return;
                }
            }
        }

        if !hidden {
            self.drain_once_visible();
            if self.superseded(sequence) {
                return;
            }
        }

        self.inner.hidden_before.set(hidden);
    }

    /// Returns `true` once the host change listener is attached.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.inner.listening.get()
    }

    // -- Timer Scheduler ---------------------------------------------------

    /// Runs `callback` every `visible_interval` while the page is visible and
    /// every `hidden_interval` while it is hidden.
    ///
    /// With `hidden_interval` set to `None` the timer is suspended while
    /// hidden. The first run happens one interval from now; when the page
    /// goes from hidden to visible the callback also runs once immediately.
    pub fn schedule<F>(
        &self,
        visible_interval: Duration,
        hidden_interval: Option<Duration>,
        callback: F,
    ) -> TimerId
    where
        F: Fn() + 'static,
    {
        let id = self.inner.timers.borrow_mut().insert(
            visible_interval,
            hidden_interval,
            Rc::new(callback),
        );
        self.ensure_listening();
        self.arm(id, self.hidden(), false);
        id
    }

    /// Runs `callback` every `interval` while visible; suspended while hidden.
    pub fn every<F>(&self, interval: Duration, callback: F) -> TimerId
    where
        F: Fn() + 'static,
    {
        self.schedule(interval, None, callback)
    }

    /// Stops a timer and removes it, returning its record.
    ///
    /// Returns `None`, changing nothing, if `id` is unknown or already
    /// stopped. Safe to call from inside the timer's own callback.
    pub fn stop(&self, id: TimerId) -> Option<Timer> {
        let removed = self.inner.timers.borrow_mut().remove(id);
        let (timer, running) = removed?;
        if let Some(handle) = running {
            self.inner.intervals.cancel(handle);
            self.trace(|t| t.timer_disarmed(&TimerDisarmedEvent { timer: id }));
        }
        self.trace(|t| t.timer_stopped(&TimerStoppedEvent { timer: id }));
        Some(timer)
    }

    /// Returns the number of registered timers.
    #[must_use]
    pub fn timer_count(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Returns `true` if the timer exists and has an active invocation.
    #[must_use]
    pub fn is_running(&self, id: TimerId) -> bool {
        self.inner.timers.borrow().is_running(id)
    }

    // -- internals ---------------------------------------------------------

    /// Attaches the host listener on first use and resets the transition
    /// baseline.
    fn ensure_listening(&self) {
        if self.inner.listening.get() {
            return;
        }
        let Some(prefix) = self.prefix() else {
            return;
        };
        self.inner.listening.set(true);

        let weak = Rc::downgrade(&self.inner);
        let listener = move |event: D::Event| {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.dispatch_change(&event);
            }
        };
        self.inner
            .document
            .add_event_listener(&prefix.resolve(LogicalName::ChangeEvent), Rc::new(listener));

        let hidden = self.hidden();
        self.inner.hidden_before.set(hidden);
        self.trace(|t| t.listener_attached(&ListenerAttachedEvent { prefix, hidden }));
    }

    /// Starts the timer under the cadence for `hidden`, optionally running
    /// it once first. Leaves it inert if hidden without a hidden cadence.
    fn arm(&self, id: TimerId, hidden: bool, immediate: bool) {
        let plan = {
            let timers = self.inner.timers.borrow();
            let Some(timer) = timers.get(id) else {
                return;
            };
            timer
                .cadence_for(hidden)
                .map(|(cadence, interval)| (cadence, interval, Rc::clone(timer.callback())))
        };
        let Some((cadence, interval, callback)) = plan else {
            self.trace(|t| t.timer_suspended(&TimerSuspendedEvent { timer: id }));
            return;
        };

        if immediate {
            self.guarded(CallbackKind::Timer(id), || callback());
            {
                let timers = self.inner.timers.borrow();
                // Stopped or re-armed by a nested dispatch from inside the callback.
                if timers.get(id).is_none() || timers.is_running(id) {
                    return;
                }
            }
            let hidden_now = self.hidden();
            if hidden_now != hidden {
                self.arm(id, hidden_now, false);
                return;
            }
        }

        let interval = interval.at_least(self.inner.config.min_interval);
        let handle = self.inner.intervals.start_repeating(interval, callback);
        let stored = self.inner.timers.borrow_mut().set_running(id, handle);
        match stored {
            Ok(()) => self.trace(|t| {
                t.timer_armed(&TimerArmedEvent {
                    timer: id,
                    cadence,
                    interval,
                    immediate,
                });
            }),
            Err(handle) => self.inner.intervals.cancel(handle),
        }
    }

    /// Returns `true` if another notification started after `sequence`.
    fn superseded(&self, sequence: u64) -> bool {
        self.inner.sequence.get() != sequence + 1
    }

    /// Cancels the timer's active invocation, keeping its record.
    fn disarm(&self, id: TimerId) {
        let running = self.inner.timers.borrow_mut().take_running(id);
        if let Some(handle) = running {
            self.inner.intervals.cancel(handle);
            self.trace(|t| t.timer_disarmed(&TimerDisarmedEvent { timer: id }));
        }
    }

    fn drain_once_visible(&self) {
        let batch = self.inner.hub.borrow_mut().take_once_visible();
        if batch.is_empty() {
            return;
        }
        let count = u32::try_from(batch.len()).unwrap_or(u32::MAX);
        for (index, callback) in batch.into_iter().enumerate() {
            let kind = CallbackKind::OnceVisible(u32::try_from(index).unwrap_or(u32::MAX));
            self.guarded(kind, callback);
        }
        self.trace(|t| t.once_visible_drain(&OnceVisibleDrainEvent { count }));
    }

    /// Runs a user callback, containing a panic when `std` is available.
    fn guarded(&self, kind: CallbackKind, f: impl FnOnce()) {
        #[cfg(feature = "std")]
        {
            let outcome = std::panic::catch_unwind(core::panic::AssertUnwindSafe(f));
            if outcome.is_err() {
                self.trace(|t| t.callback_failed(&crate::trace::CallbackFailedEvent { kind }));
            }
        }
        #[cfg(not(feature = "std"))]
        {
            _ = kind;
            f();
        }
    }

    fn trace(&self, f: impl FnOnce(&mut Tracer<'_>)) {
        // Emission from inside a sink is dropped.
        let Ok(mut slot) = self.inner.sink.try_borrow_mut() else {
            return;
        };
        let mut tracer = match slot.as_deref_mut() {
            Some(sink) => Tracer::new(sink),
            None => Tracer::none(),
        };
        f(&mut tracer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::{FakeDocument, FakeIntervals};
    use alloc::vec::Vec;

    type Vis = Visibility<FakeDocument, FakeIntervals>;

    fn context(hidden: bool) -> Vis {
        Visibility::new(FakeDocument::standard(hidden), FakeIntervals::default())
    }

    fn flip(vis: &Vis, hidden: bool) {
        vis.document().set_hidden(hidden);
        vis.document().fire(0);
    }

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        (hits, move || h.set(h.get() + 1))
    }

    #[test]
    fn unsupported_host_degrades_to_visible() {
        let vis = Visibility::new(FakeDocument::new(&[]), FakeIntervals::default());
        assert!(!vis.is_supported());
        assert!(!vis.hidden());
        assert_eq!(vis.state(), VisibilityState::Visible);
        assert!(!vis.on_change(|_, _| {}));
        assert!(vis.document().listener_names().is_empty());

        let (hits, cb) = counter();
        assert!(vis.on_visible(cb));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn listener_attaches_once_under_prefixed_name() {
        let doc = FakeDocument::new(&["webkitVisibilityState"]);
        let vis = Visibility::new(doc, FakeIntervals::default());
        assert!(!vis.is_listening());
        assert!(vis.on_change(|_, _| {}));
        assert!(vis.on_change(|_, _| {}));
        assert!(vis.is_listening());
        assert_eq!(vis.document().listener_names(), ["webkitvisibilitychange"]);
    }

    #[test]
    fn change_callbacks_run_in_order_with_event_and_state() {
        let vis = context(false);
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ['a', 'b'] {
            let log = Rc::clone(&log);
            vis.on_change(move |event: &u32, state| log.borrow_mut().push((tag, *event, state)));
        }
        vis.document().set_hidden(true);
        vis.document().fire(7);
        assert_eq!(
            *log.borrow(),
            [
                ('a', 7, VisibilityState::Hidden),
                ('b', 7, VisibilityState::Hidden)
            ]
        );
    }

    #[test]
    fn on_visible_runs_inline_when_visible() {
        let vis = context(false);
        let (hits, cb) = counter();
        assert!(vis.on_visible(cb));
        assert_eq!(hits.get(), 1);
        assert!(!vis.is_listening(), "inline run needs no listener");
    }

    #[test]
    fn on_visible_waits_for_visible_and_fires_once() {
        let vis = context(true);
        let (hits, cb) = counter();
        assert!(!vis.on_visible(cb));
        assert_eq!(hits.get(), 0);

        vis.document().fire(0);
        assert_eq!(hits.get(), 0, "still hidden");

        flip(&vis, false);
        assert_eq!(hits.get(), 1);
        flip(&vis, true);
        flip(&vis, false);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn on_visible_registered_during_drain_waits_for_next_drain() {
        let vis = context(true);
        let hits = Rc::new(Cell::new(0));
        let (vis2, h) = (vis.clone(), Rc::clone(&hits));
        vis.on_visible(move || {
            vis2.document().set_hidden(true);
            let h = Rc::clone(&h);
            vis2.on_visible(move || h.set(h.get() + 1));
            vis2.document().set_hidden(false);
        });

        flip(&vis, false);
        assert_eq!(hits.get(), 0, "deferred, not run in the same pass");
        flip(&vis, true);
        flip(&vis, false);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn schedule_arms_without_running() {
        let vis = context(false);
        let (hits, cb) = counter();
        let id = vis.schedule(Duration(1000), Some(Duration(5000)), cb);
        assert_eq!(id, TimerId(1));
        assert_eq!(hits.get(), 0);
        assert_eq!(vis.intervals().active(), [(0, Duration(1000))]);
        assert!(vis.is_listening(), "timers need transition notifications");
    }

    #[test]
    fn hidden_timer_without_hidden_cadence_stays_inert() {
        let vis = context(true);
        let (hits, cb) = counter();
        let id = vis.every(Duration(1000), cb);
        assert!(!vis.is_running(id));
        assert!(vis.intervals().active().is_empty());

        flip(&vis, false);
        assert_eq!(hits.get(), 1, "runs immediately on becoming visible");
        assert_eq!(vis.intervals().active(), [(0, Duration(1000))]);
    }

    #[test]
    fn transitions_swap_cadence() {
        let vis = context(false);
        let (hits, cb) = counter();
        vis.schedule(Duration(1000), Some(Duration(5000)), cb);

        flip(&vis, true);
        assert_eq!(hits.get(), 0, "no immediate run when going hidden");
        assert_eq!(vis.intervals().active(), [(1, Duration(5000))]);

        flip(&vis, false);
        assert_eq!(hits.get(), 1);
        assert_eq!(vis.intervals().active(), [(2, Duration(1000))]);
    }

    #[test]
    fn repeated_notification_without_flip_does_not_reschedule() {
        let vis = context(false);
        let (_hits, cb) = counter();
        vis.every(Duration(1000), cb);
        vis.document().fire(0);
        vis.document().fire(0);
        assert_eq!(vis.intervals().started(), 1);
    }

    #[test]
    fn stop_cancels_and_returns_record() {
        let vis = context(false);
        let (hits, cb) = counter();
        let id = vis.schedule(Duration(250), None, cb);
        let timer = vis.stop(id).unwrap();
        assert_eq!(timer.id(), id);
        assert_eq!(timer.visible_interval(), Duration(250));
        assert_eq!(timer.hidden_interval(), None);
        assert!(vis.intervals().active().is_empty());

        vis.intervals().fire_all();
        assert_eq!(hits.get(), 0);
        assert!(vis.stop(id).is_none());
        assert_eq!(vis.timer_count(), 0);
    }

    #[test]
    fn stop_from_inside_own_callback() {
        let vis = context(false);
        let hits = Rc::new(Cell::new(0));
        let slot = Rc::new(Cell::new(None));
        let (vis2, h, s) = (vis.clone(), Rc::clone(&hits), Rc::clone(&slot));
        let id = vis.every(Duration(10), move || {
            h.set(h.get() + 1);
            if let Some(id) = s.get() {
                vis2.stop(id);
            }
        });
        slot.set(Some(id));

        vis.intervals().fire_all();
        vis.intervals().fire_all();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn stopping_during_immediate_run_leaves_nothing_armed() {
        let vis = context(true);
        let slot = Rc::new(Cell::new(None));
        let (vis2, s) = (vis.clone(), Rc::clone(&slot));
        let id = vis.every(Duration(10), move || {
            if let Some(id) = s.get() {
                vis2.stop(id);
            }
        });
        slot.set(Some(id));

        flip(&vis, false);
        assert!(vis.intervals().active().is_empty());
        assert_eq!(vis.timer_count(), 0);
    }

    #[test]
    fn nested_dispatch_from_change_callback_supersedes_outer() {
        let vis = context(true);
        let (runs, cb) = counter();
        vis.schedule(Duration(10), Some(Duration(100)), cb);
        let (drained, once) = counter();
        assert!(!vis.on_visible(once));

        let vis2 = vis.clone();
        let first = Cell::new(true);
        vis.on_change(move |_, _| {
            if first.replace(false) {
                vis2.document().fire(1);
            }
        });

        flip(&vis, false);
        assert_eq!(runs.get(), 1, "one immediate run, from the nested dispatch");
        assert_eq!(drained.get(), 1);
        assert_eq!(vis.intervals().active(), [(1, Duration(10))]);
        assert_eq!(vis.intervals().started(), 2);
    }

    #[test]
    fn intervals_respect_configured_floor() {
        let vis = Visibility::with_config(
            FakeDocument::standard(false),
            FakeIntervals::default(),
            Config::web(),
        );
        assert_eq!(vis.config().min_interval, Duration(4));
        vis.every(Duration::ZERO, || {});
        assert_eq!(vis.intervals().active(), [(0, Duration(4))]);
    }

    #[test]
    fn attach_resets_transition_baseline() {
        // Constructed visible, but hidden by the time anything registers.
        let vis = context(false);
        vis.document().set_hidden(true);
        let (hits, cb) = counter();
        vis.schedule(Duration(1000), Some(Duration(5000)), cb);
        assert_eq!(vis.intervals().active(), [(0, Duration(5000))]);

        // Still hidden: not a transition, so nothing is rescheduled.
        vis.document().fire(0);
        assert_eq!(vis.intervals().started(), 1);
        assert_eq!(hits.get(), 0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn panicking_change_callback_does_not_stop_fan_out() {
        let vis = context(false);
        let (hits, cb) = counter();
        vis.on_change(|_, _| panic!("boom"));
        vis.on_change(move |_, _| cb());
        flip(&vis, true);
        assert_eq!(hits.get(), 1);
    }
}
