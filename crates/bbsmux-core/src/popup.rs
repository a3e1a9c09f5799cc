// SPDX-License-Identifier: MIT

//! Transient operator popups for node failures.
//!
//! At most one popup is ever live; a new alert with the same crash
//! signature as the live one is deduplicated (spec §8, testable property
//! #5), while a genuinely new signature overwrites whatever is showing.

use std::time::{Duration, Instant};

/// Popups auto-dismiss after this long if the operator doesn't act first.
pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupAlert {
    pub signature: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone)]
struct Live {
    alert: PopupAlert,
    dismiss_at: Instant,
}

/// Holds the single currently-visible popup, if any.
#[derive(Debug, Default)]
pub struct PopupStore {
    live: Option<Live>,
}

impl PopupStore {
    pub fn new() -> Self {
        Self { live: None }
    }

    /// Post a new alert. Returns `true` if it actually replaced the
    /// display (i.e. wasn't deduplicated against an identical live popup).
    pub fn post(&mut self, alert: PopupAlert, now: Instant) -> bool {
        self.post_with_deadline(alert, now + DEFAULT_DISMISS_AFTER)
    }

    pub fn post_with_deadline(&mut self, alert: PopupAlert, dismiss_at: Instant) -> bool {
        if let Some(live) = &self.live {
            if live.alert.signature == alert.signature {
                return false;
            }
        }
        self.live = Some(Live { alert, dismiss_at });
        true
    }

    /// Clear the popup if its deadline has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(live) = &self.live {
            if now >= live.dismiss_at {
                self.live = None;
            }
        }
    }

    /// Operator-initiated dismissal.
    pub fn dismiss(&mut self) {
        self.live = None;
    }

    pub fn current(&self) -> Option<&PopupAlert> {
        self.live.as_ref().map(|l| &l.alert)
    }
}

#[cfg(test)]
#[path = "popup_tests.rs"]
mod tests;
