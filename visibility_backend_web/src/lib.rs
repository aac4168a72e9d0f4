// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for `visibility_core`.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WebDocument`]: the page's `document`, read through `Reflect` so
//!   vendor-prefixed properties (`webkitHidden`, ...) resolve like any other
//! - [`WebIntervals`]: `setInterval` / `clearInterval` repeating timers
//!
//! [`install`] wires both into a [`Visibility`] context for the current
//! window.

#![no_std]

extern crate alloc;

mod document;
mod interval;

pub use document::WebDocument;
pub use interval::{WebInterval, WebIntervals};

use visibility_core::{Config, Visibility};

/// A [`Visibility`] context over the browser host.
pub type WebVisibility = Visibility<WebDocument, WebIntervals>;

/// Creates a context for the current window's document with [`Config::web`].
///
/// Returns `None` outside a window (e.g. in a worker), where there is no
/// document to observe.
#[must_use]
pub fn install() -> Option<WebVisibility> {
    let document = web_sys::window()?.document()?;
    Some(Visibility::with_config(
        WebDocument::new(document),
        WebIntervals,
        Config::web(),
    ))
}
