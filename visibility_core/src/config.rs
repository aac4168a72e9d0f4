// Copyright 2026 the Visibility Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction-time configuration for [`Visibility`](crate::Visibility).

use crate::probe::Prefix;
use crate::time::Duration;

/// Configuration for a [`Visibility`](crate::Visibility) context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Vendor prefixes tried, in order, when the unprefixed API is missing.
    pub prefixes: &'static [Prefix],
    /// Shortest cadence handed to the host. Shorter intervals (including
    /// zero) are raised to this floor when a timer is armed.
    pub min_interval: Duration,
}

impl Config {
    /// All vendor prefixes, 1 ms floor.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            prefixes: &Prefix::VENDOR,
            min_interval: Duration(1),
        }
    }

    /// Default configuration for browsers.
    ///
    /// The floor matches the HTML timer clamp for nested intervals, so the
    /// cadence we report is the one the page actually gets.
    #[must_use]
    pub const fn web() -> Self {
        Self {
            prefixes: &Prefix::VENDOR,
            min_interval: Duration(4),
        }
    }

    /// Only the standard, unprefixed API is recognized.
    #[must_use]
    pub const fn unprefixed() -> Self {
        Self {
            prefixes: &[],
            min_interval: Duration(1),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_share_the_vendor_order() {
        assert_eq!(Config::standard().prefixes, Prefix::VENDOR.as_slice());
        assert_eq!(Config::web().prefixes, Config::standard().prefixes);
        assert!(Config::unprefixed().prefixes.is_empty());
    }

    #[test]
    fn web_floor_is_the_timer_clamp() {
        assert_eq!(Config::web().min_interval, Duration(4));
        assert_eq!(Config::default(), Config::standard());
    }
}
