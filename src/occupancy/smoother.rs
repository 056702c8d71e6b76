//! Denoised occupancy decision from raw per-frame counts.

use crate::occupancy::window::OccupancyWindow;

/// Default trailing-mean threshold for the presence decision.
pub const DEFAULT_TRACKING_THRESHOLD: f32 = 0.2;

/// Smooths raw detection counts into a binary presence decision.
///
/// A single-frame flicker in the detector moves the window mean by at most
/// 1/capacity, so it cannot flip the decision on its own. The output is a
/// presence bit, not a count: multi-person frames collapse to "present".
pub struct OccupancySmoother {
    window: OccupancyWindow,
    tracking_threshold: f32,
}

impl OccupancySmoother {
    pub fn new(capacity: usize, tracking_threshold: f32) -> Self {
        Self {
            window: OccupancyWindow::new(capacity),
            tracking_threshold,
        }
    }

    /// Fold in this frame's raw count and return the occupancy decision.
    pub fn observe(&mut self, raw_count: u32) -> bool {
        self.window.push(raw_count);
        self.window.mean() > self.tracking_threshold
    }
}

impl Default for OccupancySmoother {
    fn default() -> Self {
        Self::new(
            crate::occupancy::window::DEFAULT_WINDOW_CAPACITY,
            DEFAULT_TRACKING_THRESHOLD,
        )
    }
}
