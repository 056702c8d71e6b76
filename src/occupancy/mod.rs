//! Occupancy derivation from per-frame detection counts.
//!
//! Raw counts flow through a trailing-window smoother that yields a binary
//! presence decision, then through a state machine that turns decision edges
//! into entry totals and dwell durations. Both stages are pure state over
//! plain inputs so they can be unit tested without a stream or a broker.

mod smoother;
mod state;
mod window;

pub use smoother::{OccupancySmoother, DEFAULT_TRACKING_THRESHOLD};
pub use state::{DurationEvent, FrameTelemetry, OccupancyStateMachine};
pub use window::{OccupancyWindow, DEFAULT_WINDOW_CAPACITY};
