// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reading the current visibility state.
//!
//! Both readers fail open: a host without the visibility API is reported as
//! visible, so anything keyed off visibility runs at its full cadence.

use core::fmt;

use crate::host::Document;
use crate::probe::{LogicalName, Probe};

/// Host-provided classification of whether the page is shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum VisibilityState {
    /// The page is at least partially visible.
    #[default]
    Visible,
    /// The page is not shown (background tab, minimized window, locked screen).
    Hidden,
    /// The page is being rendered off-screen ahead of navigation.
    Prerender,
}

impl VisibilityState {
    /// Returns the host's label for this state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Prerender => "prerender",
        }
    }

    /// Parses a host label. Unknown labels return `None`.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "visible" => Some(Self::Visible),
            "hidden" => Some(Self::Hidden),
            "prerender" => Some(Self::Prerender),
            _ => None,
        }
    }
}

impl fmt::Display for VisibilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the host's `hidden` flag, or `false` if the API is unsupported.
pub fn hidden<D: Document + ?Sized>(probe: &Probe, document: &D) -> bool {
    match probe.detect(document) {
        Some(prefix) => document.bool_property(&prefix.resolve(LogicalName::Hidden)),
        None => false,
    }
}

/// Returns the host's tri-state label, or [`VisibilityState::Visible`] if the
/// API is unsupported.
///
/// Labels this crate does not know (the long-gone `unloaded`, or garbage
/// from a broken host) are derived from the `hidden` flag instead.
pub fn state<D: Document + ?Sized>(probe: &Probe, document: &D) -> VisibilityState {
    let Some(prefix) = probe.detect(document) else {
        return VisibilityState::Visible;
    };
    document
        .string_property(&prefix.resolve(LogicalName::VisibilityState))
        .as_deref()
        .and_then(VisibilityState::from_label)
        .unwrap_or_else(|| {
            if document.bool_property(&prefix.resolve(LogicalName::Hidden)) {
                VisibilityState::Hidden
            } else {
                VisibilityState::Visible
            }
        })
}
