//! Trailing window of raw per-frame detection counts.

use std::collections::VecDeque;

/// Default number of frames the smoothing window covers.
pub const DEFAULT_WINDOW_CAPACITY: usize = 30;

/// Fixed-capacity ring buffer of raw counts.
///
/// `mean` divides by the configured capacity, not the current length. During
/// warm-up the window is short of samples, so the mean is biased low and the
/// occupancy decision starts conservative (absent). Downstream thresholds are
/// calibrated against this, so the denominator stays fixed.
pub struct OccupancyWindow {
    samples: VecDeque<u32>,
    capacity: usize,
}

impl OccupancyWindow {
    /// Create a window. `capacity` must be non-zero; callers validate via
    /// config before construction.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be non-zero");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest once at capacity.
    pub fn push(&mut self, raw_count: u32) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(raw_count);
    }

    /// Sum over buffered samples divided by the configured capacity.
    pub fn mean(&self) -> f32 {
        let sum: u64 = self.samples.iter().map(|&c| c as u64).sum();
        sum as f32 / self.capacity as f32
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for OccupancyWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}
