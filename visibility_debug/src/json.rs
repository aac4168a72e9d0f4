// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON exporter for recorded traces.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes a JSON array with one object per event. Every object carries
//! an `"event"` name; the remaining keys mirror the event's fields.

use std::io::{self, Write};

use serde_json::{Value, json};

use visibility_core::trace::CallbackKind;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as a pretty-printed JSON array.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes).map(to_value).collect();
    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn to_value(recorded: RecordedEvent) -> Value {
    match recorded {
        RecordedEvent::ListenerAttached(e) => json!({
            "event": "ListenerAttached",
            "prefix": e.prefix.as_str(),
            "hidden": e.hidden,
        }),
        RecordedEvent::Change(e) => json!({
            "event": "Change",
            "sequence": e.sequence,
            "state": e.state.as_str(),
            "hidden": e.hidden,
            "was_hidden": e.was_hidden,
            "transition": e.is_transition(),
            "callbacks": e.callbacks,
        }),
        RecordedEvent::TimerArmed(e) => json!({
            "event": "TimerArmed",
            "timer": e.timer.0,
            "cadence": format!("{:?}", e.cadence),
            "interval_ms": e.interval.as_millis(),
            "immediate": e.immediate,
        }),
        RecordedEvent::TimerDisarmed(e) => json!({
            "event": "TimerDisarmed",
            "timer": e.timer.0,
        }),
        RecordedEvent::TimerSuspended(e) => json!({
            "event": "TimerSuspended",
            "timer": e.timer.0,
        }),
        RecordedEvent::TimerStopped(e) => json!({
            "event": "TimerStopped",
            "timer": e.timer.0,
        }),
        RecordedEvent::OnceVisibleDrain(e) => json!({
            "event": "OnceVisibleDrain",
            "count": e.count,
        }),
        RecordedEvent::CallbackFailed(e) => match e.kind {
            CallbackKind::Change(index) => json!({
                "event": "CallbackFailed",
                "kind": "change",
                "index": index,
            }),
            CallbackKind::OnceVisible(index) => json!({
                "event": "CallbackFailed",
                "kind": "once_visible",
                "index": index,
            }),
            CallbackKind::Timer(id) => json!({
                "event": "CallbackFailed",
                "kind": "timer",
                "timer": id.0,
            }),
        },
    }
}
