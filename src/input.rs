//! Single-button input classification.
//!
//! A short press advances the run (start or split); holding the button past
//! the threshold resets. Device polling lives outside this crate: callers feed
//! press and release edges plus periodic polls into a [`PressTracker`] and
//! apply the resulting [`InputAction`] to the engine.

use std::time::{Duration, Instant};
use tracing::trace;

/// Default hold time before a press becomes a reset.
pub const DEFAULT_HOLD_THRESHOLD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Split,
    Reset,
}

#[derive(Debug, Clone)]
pub struct PressTracker {
    hold_threshold: Duration,
    pressed_at: Option<Instant>,
    reset_fired: bool,
}

impl Default for PressTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD_THRESHOLD)
    }
}

impl PressTracker {
    pub fn new(hold_threshold: Duration) -> Self {
        Self { hold_threshold, pressed_at: None, reset_fired: false }
    }

    pub fn hold_threshold(&self) -> Duration {
        self.hold_threshold
    }

    pub fn is_held(&self) -> bool {
        self.pressed_at.is_some()
    }

    /// Button went down. Repeated presses without a release keep the first
    /// timestamp.
    pub fn press(&mut self, at: Instant) {
        if self.pressed_at.is_none() {
            self.pressed_at = Some(at);
            self.reset_fired = false;
        }
    }

    /// Check an ongoing hold. Returns [`InputAction::Reset`] once per press
    /// when held strictly longer than the threshold.
    pub fn poll(&mut self, at: Instant) -> Option<InputAction> {
        let pressed_at = self.pressed_at?;
        if self.reset_fired || at.saturating_duration_since(pressed_at) <= self.hold_threshold {
            return None;
        }
        self.reset_fired = true;
        trace!("Hold exceeded {:?}, resetting", self.hold_threshold);
        Some(InputAction::Reset)
    }

    /// Button went up. A release that ends a hold past the threshold resets if
    /// no poll caught it first; otherwise it is a split unless the reset
    /// already fired for this press.
    pub fn release(&mut self, at: Instant) -> Option<InputAction> {
        let action = match self.poll(at) {
            Some(reset) => Some(reset),
            None if self.pressed_at.is_some() && !self.reset_fired => Some(InputAction::Split),
            None => None,
        };
        self.pressed_at = None;
        self.reset_fired = false;
        action
    }
}
