// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page visibility detection and visibility-aware recurring timers.
//!
//! `visibility_core` exposes whether a page is currently shown to the user,
//! fans the host's change notification out to application callbacks, and runs
//! recurring jobs at one cadence while visible and another (or none) while
//! hidden. It is `no_std` compatible (with `alloc`) and single-threaded: all
//! state lives behind `Rc`/`RefCell` and is only touched on the host's event
//! thread.
//!
//! # Architecture
//!
//! Data flows one way, from the host's change event to everything keyed off
//! it:
//!
//! ```text
//!   Document (host)            Intervals (host)
//!       │  visibilitychange          ▲  start_repeating / cancel
//!       ▼                            │
//!   Visibility::dispatch_change ─────┤
//!       │                            │
//!       ├──► change callbacks (registration order)
//!       ├──► transition? ──► TimerRegistry: stop + re-arm every timer
//!       └──► visible?    ──► drain one-shot queue
//! ```
//!
//! **[`probe`]**: Finds the name variant (unprefixed or vendor-prefixed) the
//! host uses, once, and resolves logical names to concrete ones.
//!
//! **[`state`]**: [`VisibilityState`] and the fail-open readers built on the
//! probe.
//!
//! **[`hub`]**: Ordered change callbacks and the one-shot visible queue.
//!
//! **[`timer`]**: Timer records, ids and cadence selection.
//!
//! **[`host`]**: The [`Document`](host::Document) and
//! [`Intervals`](host::Intervals) traits backends implement.
//!
//! **[`config`]**: Prefix candidates and the minimum cadence.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! instrumentation, with zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! [`Visibility`] ties these together and is the type applications hold.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Contains panics raised by user callbacks so
//!   one failing callback does not abort delivery to the rest.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod host;
pub mod hub;
pub mod probe;
pub mod state;
pub mod time;
pub mod timer;
pub mod trace;

mod visibility;

#[cfg(test)]
mod test_host;

pub use config::Config;
pub use state::VisibilityState;
pub use time::Duration;
pub use timer::{Timer, TimerId};
pub use visibility::Visibility;
