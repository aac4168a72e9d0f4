// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records, each led by a one-byte tag.
//! [`decode`] reads them back as an iterator of [`RecordedEvent`].

use visibility_core::VisibilityState;
use visibility_core::probe::Prefix;
use visibility_core::time::Duration;
use visibility_core::timer::{Cadence, TimerId};
use visibility_core::trace::{
    CallbackFailedEvent, CallbackKind, ChangeEvent, ListenerAttachedEvent, OnceVisibleDrainEvent,
    TimerArmedEvent, TimerDisarmedEvent, TimerStoppedEvent, TimerSuspendedEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_LISTENER_ATTACHED: u8 = 1;
const TAG_CHANGE: u8 = 2;
const TAG_TIMER_ARMED: u8 = 3;
const TAG_TIMER_DISARMED: u8 = 4;
const TAG_TIMER_SUSPENDED: u8 = 5;
const TAG_TIMER_STOPPED: u8 = 6;
const TAG_ONCE_VISIBLE_DRAIN: u8 = 7;
const TAG_CALLBACK_FAILED: u8 = 8;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_prefix(&mut self, p: Prefix) {
        self.write_u8(match p {
            Prefix::Unprefixed => 0,
            Prefix::Webkit => 1,
            Prefix::Moz => 2,
            Prefix::O => 3,
            Prefix::Ms => 4,
        });
    }

    fn write_state(&mut self, s: VisibilityState) {
        self.write_u8(match s {
            VisibilityState::Visible => 0,
            VisibilityState::Hidden => 1,
            VisibilityState::Prerender => 2,
        });
    }

    fn write_cadence(&mut self, c: Cadence) {
        self.write_u8(match c {
            Cadence::Visible => 0,
            Cadence::Hidden => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_listener_attached(&mut self, e: &ListenerAttachedEvent) {
        self.write_u8(TAG_LISTENER_ATTACHED);
        self.write_prefix(e.prefix);
        self.write_bool(e.hidden);
    }

    fn on_change(&mut self, e: &ChangeEvent) {
        self.write_u8(TAG_CHANGE);
        self.write_u64(e.sequence);
        self.write_state(e.state);
        self.write_bool(e.hidden);
        self.write_bool(e.was_hidden);
        self.write_u32(e.callbacks);
    }

    fn on_timer_armed(&mut self, e: &TimerArmedEvent) {
        self.write_u8(TAG_TIMER_ARMED);
        self.write_u64(e.timer.0);
        self.write_cadence(e.cadence);
        self.write_u64(e.interval.as_millis());
        self.write_bool(e.immediate);
    }

    fn on_timer_disarmed(&mut self, e: &TimerDisarmedEvent) {
        self.write_u8(TAG_TIMER_DISARMED);
        self.write_u64(e.timer.0);
    }

    fn on_timer_suspended(&mut self, e: &TimerSuspendedEvent) {
        self.write_u8(TAG_TIMER_SUSPENDED);
        self.write_u64(e.timer.0);
    }

    fn on_timer_stopped(&mut self, e: &TimerStoppedEvent) {
        self.write_u8(TAG_TIMER_STOPPED);
        self.write_u64(e.timer.0);
    }

    fn on_once_visible_drain(&mut self, e: &OnceVisibleDrainEvent) {
        self.write_u8(TAG_ONCE_VISIBLE_DRAIN);
        self.write_u32(e.count);
    }

    fn on_callback_failed(&mut self, e: &CallbackFailedEvent) {
        self.write_u8(TAG_CALLBACK_FAILED);
        let (kind, value) = match e.kind {
            CallbackKind::Change(i) => (0, u64::from(i)),
            CallbackKind::OnceVisible(i) => (1, u64::from(i)),
            CallbackKind::Timer(id) => (2, id.0),
        };
        self.write_u8(kind);
        self.write_u64(value);
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// A decoded trace event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`ListenerAttachedEvent`].
    ListenerAttached(ListenerAttachedEvent),
    /// A [`ChangeEvent`].
    Change(ChangeEvent),
    /// A [`TimerArmedEvent`].
    TimerArmed(TimerArmedEvent),
    /// A [`TimerDisarmedEvent`].
    TimerDisarmed(TimerDisarmedEvent),
    /// A [`TimerSuspendedEvent`].
    TimerSuspended(TimerSuspendedEvent),
    /// A [`TimerStoppedEvent`].
    TimerStopped(TimerStoppedEvent),
    /// An [`OnceVisibleDrainEvent`].
    OnceVisibleDrain(OnceVisibleDrainEvent),
    /// A [`CallbackFailedEvent`].
    CallbackFailed(CallbackFailedEvent),
}

/// Returns an iterator that decodes events from recorded bytes.
///
/// Iteration stops at the first truncated record or unknown tag.
#[must_use]
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter { remaining: bytes }
}

/// Iterator over decoded events from a byte slice.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    remaining: &'a [u8],
}

impl DecodeIter<'_> {
    fn read_u8(&mut self) -> Option<u8> {
        let (&v, rest) = self.remaining.split_first()?;
        self.remaining = rest;
        Some(v)
    }

    fn read_bool(&mut self) -> Option<bool> {
        match self.read_u8()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining.len() < 4 {
            return None;
        }
        let (bytes, rest) = self.remaining.split_at(4);
        self.remaining = rest;
        Some(u32::from_le_bytes(bytes.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining.len() < 8 {
            return None;
        }
        let (bytes, rest) = self.remaining.split_at(8);
        self.remaining = rest;
        Some(u64::from_le_bytes(bytes.try_into().ok()?))
    }

    fn read_prefix(&mut self) -> Option<Prefix> {
        match self.read_u8()? {
            0 => Some(Prefix::Unprefixed),
            1 => Some(Prefix::Webkit),
            2 => Some(Prefix::Moz),
            3 => Some(Prefix::O),
            4 => Some(Prefix::Ms),
            _ => None,
        }
    }

    fn read_state(&mut self) -> Option<VisibilityState> {
        match self.read_u8()? {
            0 => Some(VisibilityState::Visible),
            1 => Some(VisibilityState::Hidden),
            2 => Some(VisibilityState::Prerender),
            _ => None,
        }
    }

    fn read_cadence(&mut self) -> Option<Cadence> {
        match self.read_u8()? {
            0 => Some(Cadence::Visible),
            1 => Some(Cadence::Hidden),
            _ => None,
        }
    }

    fn read_timer(&mut self) -> Option<TimerId> {
        self.read_u64().map(TimerId)
    }

    fn decode_listener_attached(&mut self) -> Option<RecordedEvent> {
        let prefix = self.read_prefix()?;
        let hidden = self.read_bool()?;
        Some(RecordedEvent::ListenerAttached(ListenerAttachedEvent {
            prefix,
            hidden,
        }))
    }

    fn decode_change(&mut self) -> Option<RecordedEvent> {
        let sequence = self.read_u64()?;
        let state = self.read_state()?;
        let hidden = self.read_bool()?;
        let was_hidden = self.read_bool()?;
        let callbacks = self.read_u32()?;
        Some(RecordedEvent::Change(ChangeEvent {
            sequence,
            state,
            hidden,
            was_hidden,
            callbacks,
        }))
    }

    fn decode_timer_armed(&mut self) -> Option<RecordedEvent> {
        let timer = self.read_timer()?;
        let cadence = self.read_cadence()?;
        let interval = Duration(self.read_u64()?);
        let immediate = self.read_bool()?;
        Some(RecordedEvent::TimerArmed(TimerArmedEvent {
            timer,
            cadence,
            interval,
            immediate,
        }))
    }

    fn decode_callback_failed(&mut self) -> Option<RecordedEvent> {
        let kind = self.read_u8()?;
        let value = self.read_u64()?;
        let kind = match kind {
            0 => CallbackKind::Change(u32::try_from(value).ok()?),
            1 => CallbackKind::OnceVisible(u32::try_from(value).ok()?),
            2 => CallbackKind::Timer(TimerId(value)),
            _ => return None,
        };
        Some(RecordedEvent::CallbackFailed(CallbackFailedEvent { kind }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_LISTENER_ATTACHED => self.decode_listener_attached(),
            TAG_CHANGE => self.decode_change(),
            TAG_TIMER_ARMED => self.decode_timer_armed(),
            TAG_TIMER_DISARMED => {
                let timer = self.read_timer()?;
                Some(RecordedEvent::TimerDisarmed(TimerDisarmedEvent { timer }))
            }
            TAG_TIMER_SUSPENDED => {
                let timer = self.read_timer()?;
                Some(RecordedEvent::TimerSuspended(TimerSuspendedEvent { timer }))
            }
            TAG_TIMER_STOPPED => {
                let timer = self.read_timer()?;
                Some(RecordedEvent::TimerStopped(TimerStoppedEvent { timer }))
            }
            TAG_ONCE_VISIBLE_DRAIN => {
                let count = self.read_u32()?;
                Some(RecordedEvent::OnceVisibleDrain(OnceVisibleDrainEvent {
                    count,
                }))
            }
            TAG_CALLBACK_FAILED => self.decode_callback_failed(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_change() -> ChangeEvent {
        ChangeEvent {
            sequence: 3,
            state: VisibilityState::Prerender,
            hidden: true,
            was_hidden: false,
            callbacks: 2,
        }
    }

    #[test]
    fn change_decodes_field_for_field() {
        let mut rec = RecorderSink::new();
        rec.on_change(&sample_change());
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events, [RecordedEvent::Change(sample_change())]);
    }

    #[test]
    fn timer_lifecycle_keeps_order() {
        let mut rec = RecorderSink::new();
        rec.on_listener_attached(&ListenerAttachedEvent {
            prefix: Prefix::Moz,
            hidden: false,
        });
        rec.on_timer_armed(&TimerArmedEvent {
            timer: TimerId(1),
            cadence: Cadence::Hidden,
            interval: Duration(5000),
            immediate: false,
        });
        rec.on_timer_suspended(&TimerSuspendedEvent { timer: TimerId(2) });
        rec.on_timer_disarmed(&TimerDisarmedEvent { timer: TimerId(1) });
        rec.on_timer_stopped(&TimerStoppedEvent { timer: TimerId(1) });
        rec.on_once_visible_drain(&OnceVisibleDrainEvent { count: 4 });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 6);
        match &events[1] {
            RecordedEvent::TimerArmed(e) => {
                assert_eq!(e.timer, TimerId(1));
                assert_eq!(e.cadence, Cadence::Hidden);
                assert_eq!(e.interval, Duration(5000));
                assert!(!e.immediate);
            }
            other => panic!("expected TimerArmed, got {other:?}"),
        }
        assert_eq!(
            events[0],
            RecordedEvent::ListenerAttached(ListenerAttachedEvent {
                prefix: Prefix::Moz,
                hidden: false,
            })
        );
        assert_eq!(
            events[5],
            RecordedEvent::OnceVisibleDrain(OnceVisibleDrainEvent { count: 4 })
        );
    }

    #[test]
    fn callback_failures_keep_their_kind() {
        let mut rec = RecorderSink::new();
        for kind in [
            CallbackKind::Change(0),
            CallbackKind::OnceVisible(7),
            CallbackKind::Timer(TimerId(42)),
        ] {
            rec.on_callback_failed(&CallbackFailedEvent { kind });
        }
        let kinds: Vec<_> = decode(rec.as_bytes())
            .map(|e| match e {
                RecordedEvent::CallbackFailed(f) => f.kind,
                other => panic!("expected CallbackFailed, got {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            [
                CallbackKind::Change(0),
                CallbackKind::OnceVisible(7),
                CallbackKind::Timer(TimerId(42)),
            ]
        );
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_timer_stopped(&TimerStoppedEvent { timer: TimerId(1) });
        rec.on_change(&sample_change());
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 1];
        let events: Vec<_> = decode(cut).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn unknown_tag_stops_iteration() {
        let events: Vec<_> = decode(&[0xff, 1, 2, 3]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn empty_input() {
        assert_eq!(decode(&[]).count(), 0);
    }
}
