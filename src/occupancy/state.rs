//! Occupancy state machine: entry/exit transitions, totals, dwell durations.

use std::time::Instant;

/// Emitted once per visit, on the exit transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DurationEvent {
    /// Dwell time in whole seconds, truncated.
    pub seconds: u64,
}

/// Telemetry derived from one processed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTelemetry {
    /// Smoothed occupancy decision as a count (0 or 1). Emitted every frame.
    pub current: u32,
    /// New cumulative total, present only on an entry transition.
    pub total: Option<u64>,
    /// Dwell duration, present only on an exit transition.
    pub duration: Option<DurationEvent>,
}

/// Tracks occupancy transitions across the life of a stream.
///
/// Starts absent; there is no terminal state. Advanced exactly once per
/// processed frame with that frame's smoothed decision. Performs no I/O and
/// cannot fail; frames skipped upstream simply never reach it.
pub struct OccupancyStateMachine {
    previous: bool,
    total_entries: u64,
    entered_at: Option<Instant>,
}

impl OccupancyStateMachine {
    pub fn new() -> Self {
        Self {
            previous: false,
            total_entries: 0,
            entered_at: None,
        }
    }

    /// Consume this frame's occupancy decision.
    ///
    /// A rising edge records the entry instant and bumps the total; a falling
    /// edge emits the dwell duration and clears the entry instant. Equal
    /// consecutive decisions emit only the per-frame current count.
    pub fn advance(&mut self, present: bool, now: Instant) -> FrameTelemetry {
        let mut total = None;
        let mut duration = None;

        if present && !self.previous {
            self.entered_at = Some(now);
            self.total_entries += 1;
            total = Some(self.total_entries);
        } else if !present && self.previous {
            let entered_at = self.entered_at.take();
            let seconds = entered_at
                .map(|t| now.saturating_duration_since(t).as_secs())
                .unwrap_or(0);
            duration = Some(DurationEvent { seconds });
        }

        self.previous = present;
        FrameTelemetry {
            current: present as u32,
            total,
            duration,
        }
    }

    pub fn is_present(&self) -> bool {
        self.previous
    }

    pub fn total_entries(&self) -> u64 {
        self.total_entries
    }
}

impl Default for OccupancyStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
