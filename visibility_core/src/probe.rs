// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability detection and vendor-prefixed name resolution.
//!
//! Older engines shipped the visibility API behind a vendor prefix
//! (`webkitHidden`, `mozVisibilityState`, `msvisibilitychange`, ...). The
//! [`Probe`] finds out once which variant the host speaks, and
//! [`Prefix::resolve`] turns a [`LogicalName`] into the concrete property or
//! event name for that variant.

use alloc::borrow::Cow;
use alloc::format;
use core::cell::Cell;

use crate::host::Document;

/// The name variant under which a host exposes the visibility API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Prefix {
    /// Standard, unprefixed names.
    Unprefixed,
    /// `webkit` (Chrome < 33, Safari < 7).
    Webkit,
    /// `moz` (Firefox < 18).
    Moz,
    /// `o` (Presto Opera).
    O,
    /// `ms` (IE 10).
    Ms,
}

impl Prefix {
    /// Vendor prefixes in the order they are tried.
    pub const VENDOR: [Self; 4] = [Self::Webkit, Self::Moz, Self::O, Self::Ms];

    /// Returns the literal prefix string (empty for [`Unprefixed`](Self::Unprefixed)).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unprefixed => "",
            Self::Webkit => "webkit",
            Self::Moz => "moz",
            Self::O => "o",
            Self::Ms => "ms",
        }
    }

    /// Returns the concrete host name of `name` under this prefix.
    ///
    /// Properties capitalize their first letter after a prefix
    /// (`webkitHidden`); the change event is a plain concatenation
    /// (`webkitvisibilitychange`).
    #[must_use]
    pub fn resolve(self, name: LogicalName) -> Cow<'static, str> {
        let base = name.as_str();
        match (self, name) {
            (Self::Unprefixed, _) => Cow::Borrowed(base),
            (_, LogicalName::ChangeEvent) => Cow::Owned(format!("{}{base}", self.as_str())),
            _ => {
                let mut chars = base.chars();
                match chars.next() {
                    Some(first) => Cow::Owned(format!(
                        "{}{}{}",
                        self.as_str(),
                        first.to_ascii_uppercase(),
                        chars.as_str()
                    )),
                    None => Cow::Borrowed(self.as_str()),
                }
            }
        }
    }
}

/// A host-independent name for one piece of the visibility API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicalName {
    /// The boolean `hidden` property.
    Hidden,
    /// The string `visibilityState` property.
    VisibilityState,
    /// The `visibilitychange` event.
    ChangeEvent,
}

impl LogicalName {
    /// Returns the standard, unprefixed spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::VisibilityState => "visibilityState",
            Self::ChangeEvent => "visibilitychange",
        }
    }
}

/// Memoizing capability probe.
///
/// A successful detection (including [`Prefix::Unprefixed`]) is cached for
/// the life of the probe. A failed detection is not: hosts that gain the API
/// later (rare, but possible in test environments) are picked up on the next
/// call.
#[derive(Debug)]
pub struct Probe {
    candidates: &'static [Prefix],
    detected: Cell<Option<Prefix>>,
}

impl Probe {
    /// Creates a probe that falls back to `candidates`, in order, when the
    /// unprefixed API is missing.
    #[must_use]
    pub const fn new(candidates: &'static [Prefix]) -> Self {
        Self {
            candidates,
            detected: Cell::new(None),
        }
    }

    /// Detects the prefix `document` uses, or `None` if it has no visibility
    /// API at all.
    pub fn detect<D: Document + ?Sized>(&self, document: &D) -> Option<Prefix> {
        if let Some(prefix) = self.detected.get() {
            return Some(prefix);
        }
        let state = LogicalName::VisibilityState;
        let found = core::iter::once(Prefix::Unprefixed)
            .chain(self.candidates.iter().copied())
            .find(|prefix| document.has_property(&prefix.resolve(state)));
        if found.is_some() {
            self.detected.set(found);
        }
        found
    }

    /// Returns the cached detection result without touching the host.
    #[must_use]
    pub fn cached(&self) -> Option<Prefix> {
        self.detected.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_host::FakeDocument;

    #[test]
    fn unprefixed_names_pass_through() {
        for name in [
            LogicalName::Hidden,
            LogicalName::VisibilityState,
            LogicalName::ChangeEvent,
        ] {
            assert_eq!(Prefix::Unprefixed.resolve(name), name.as_str());
        }
    }

    #[test]
    fn prefixed_properties_are_capitalized() {
        assert_eq!(Prefix::Webkit.resolve(LogicalName::Hidden), "webkitHidden");
        assert_eq!(
            Prefix::Moz.resolve(LogicalName::VisibilityState),
            "mozVisibilityState"
        );
        assert_eq!(Prefix::O.resolve(LogicalName::Hidden), "oHidden");
    }

    #[test]
    fn prefixed_event_is_concatenated() {
        assert_eq!(
            Prefix::Ms.resolve(LogicalName::ChangeEvent),
            "msvisibilitychange"
        );
        assert_eq!(
            Prefix::Webkit.resolve(LogicalName::ChangeEvent),
            "webkitvisibilitychange"
        );
    }

    #[test]
    fn unprefixed_wins_over_vendor() {
        let doc = FakeDocument::new(&["visibilityState", "webkitVisibilityState"]);
        let probe = Probe::new(&Prefix::VENDOR);
        assert_eq!(probe.detect(&doc), Some(Prefix::Unprefixed));
    }

    #[test]
    fn vendor_candidates_tried_in_order() {
        let doc = FakeDocument::new(&["msVisibilityState", "mozVisibilityState"]);
        let probe = Probe::new(&Prefix::VENDOR);
        assert_eq!(probe.detect(&doc), Some(Prefix::Moz));
    }

    #[test]
    fn success_is_memoized() {
        let doc = FakeDocument::new(&["oVisibilityState"]);
        let probe = Probe::new(&Prefix::VENDOR);
        assert_eq!(probe.detect(&doc), Some(Prefix::O));
        let lookups = doc.lookups();

        doc.set_properties(&[]);
        assert_eq!(probe.detect(&doc), Some(Prefix::O));
        assert_eq!(doc.lookups(), lookups, "cached result must not re-probe");
    }

    #[test]
    fn failure_is_not_memoized() {
        let doc = FakeDocument::new(&[]);
        let probe = Probe::new(&Prefix::VENDOR);
        assert_eq!(probe.detect(&doc), None);
        assert_eq!(probe.cached(), None);

        doc.set_properties(&["webkitVisibilityState"]);
        assert_eq!(probe.detect(&doc), Some(Prefix::Webkit));
    }

    #[test]
    fn restricted_candidates_ignore_other_vendors() {
        let doc = FakeDocument::new(&["webkitVisibilityState"]);
        let probe = Probe::new(&[]);
        assert_eq!(probe.detect(&doc), None);
    }
}
