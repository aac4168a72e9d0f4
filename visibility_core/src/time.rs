// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timer cadences.
//!
//! [`Duration`] is a whole number of milliseconds, the unit every host
//! repeating-timer facility we target (`setInterval`, the simulated clock)
//! speaks natively. Conversions saturate rather than wrapping.

use core::fmt;

/// A span of time in milliseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// Zero duration.
    pub const ZERO: Self = Self(0);

    /// Creates a duration from milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Creates a duration from whole seconds.
    #[inline]
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Returns the duration in milliseconds.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Returns `self`, raised to `floor` if it is shorter.
    #[inline]
    #[must_use]
    pub const fn at_least(self, floor: Self) -> Self {
        if self.0 < floor.0 { floor } else { self }
    }
}

impl From<core::time::Duration> for Duration {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "cadences beyond u64::MAX milliseconds are saturated below"
    )]
    fn from(d: core::time::Duration) -> Self {
        let ms = d.as_millis();
        if ms > u64::MAX as u128 {
            Self(u64::MAX)
        } else {
            Self(ms as u64)
        }
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
