//! Container size tracking.
//!
//! Hidden containers report a zero width, so a measurement is never applied
//! synchronously: resize and visibility events schedule a re-measurement
//! [`REMEASURE_DELAY`] later, and zero-width readings are ignored.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

pub const DEFAULT_WIDTH: f64 = 800.0;
pub const DEFAULT_HEIGHT: f64 = 300.0;

/// Delay between a resize/visibility event and the re-measurement
pub const REMEASURE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewportTracker {
    current: Viewport,
    pending: Option<Instant>,
}

impl ViewportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker whose first measurement is already known
    pub fn starting_at(viewport: Viewport) -> Self {
        Self { current: viewport, pending: None }
    }

    pub fn viewport(&self) -> Viewport {
        self.current
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Window resized: schedule a re-measurement
    pub fn on_resize(&mut self, now: Instant) {
        self.pending = Some(now + REMEASURE_DELAY);
    }

    /// Container visibility changed; only becoming visible schedules a measurement
    pub fn on_visibility(&mut self, visible: bool, now: Instant) {
        if visible {
            self.pending = Some(now + REMEASURE_DELAY);
        }
    }

    /// Apply `measured` if a scheduled measurement is due.
    ///
    /// Returns true when the viewport changed. A zero height keeps the
    /// current one.
    pub fn poll(&mut self, now: Instant, measured: Viewport) -> bool {
        match self.pending {
            Some(due) if now >= due => {
                self.pending = None;
                self.apply(measured)
            }
            _ => false,
        }
    }

    fn apply(&mut self, measured: Viewport) -> bool {
        if !measured.width.is_finite() || measured.width <= 0.0 {
            return false;
        }
        let height = if measured.height.is_finite() && measured.height > 0.0 {
            measured.height
        } else {
            self.current.height
        };
        let next = Viewport::new(measured.width, height);
        if next == self.current {
            return false;
        }
        self.current = next;
        true
    }
}
