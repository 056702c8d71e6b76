//! Telemetry publishing.
//!
//! Two channels, matching the wire contract of the counter: the occupancy
//! topic carries `{"count": n}` every frame and `{"total": n}` on each entry;
//! the duration topic carries `{"duration": secs}` on each exit. Delivery is
//! at-most-once; the pipeline never waits for acknowledgement.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde::Serialize;

use crate::occupancy::DurationEvent;

mod mqtt;

pub use mqtt::{MqttPublisher, MqttSettings};

#[derive(Serialize)]
pub(crate) struct CountPayload {
    pub count: u32,
}

#[derive(Serialize)]
pub(crate) struct TotalPayload {
    pub total: u64,
}

#[derive(Serialize)]
pub(crate) struct DurationPayload {
    pub duration: u64,
}

/// Sink for occupancy telemetry. Injected into the driver; implementations
/// own their transport.
pub trait TelemetryPublisher: Send {
    /// Per-frame smoothed occupancy count (0 or 1).
    fn publish_count(&mut self, count: u32) -> Result<()>;

    /// New cumulative total, published on entry transitions.
    fn publish_total(&mut self, total: u64) -> Result<()>;

    /// Dwell duration, published on exit transitions.
    fn publish_duration(&mut self, event: &DurationEvent) -> Result<()>;

    /// Tear down the transport. Called once at stream end.
    fn disconnect(self: Box<Self>) -> Result<()>;
}

/// Publisher that discards everything. Used when no broker is configured.
pub struct NullPublisher;

impl TelemetryPublisher for NullPublisher {
    fn publish_count(&mut self, _count: u32) -> Result<()> {
        Ok(())
    }

    fn publish_total(&mut self, _total: u64) -> Result<()> {
        Ok(())
    }

    fn publish_duration(&mut self, _event: &DurationEvent) -> Result<()> {
        Ok(())
    }

    fn disconnect(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// One recorded telemetry emission, in publish order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TelemetryEvent {
    Count(u32),
    Total(u64),
    Duration(u64),
}

/// Publisher that records emissions in order. Test support for driving the
/// pipeline without a broker.
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    disconnected: Arc<Mutex<bool>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            disconnected: Arc::new(Mutex::new(false)),
        }
    }

    /// Shared handle to the recorded events, valid after the publisher has
    /// been consumed by the driver.
    pub fn events(&self) -> Arc<Mutex<Vec<TelemetryEvent>>> {
        Arc::clone(&self.events)
    }

    pub fn disconnected_flag(&self) -> Arc<Mutex<bool>> {
        Arc::clone(&self.disconnected)
    }

    fn record(&self, event: TelemetryEvent) {
        self.events.lock().expect("recording lock").push(event);
    }
}

impl Default for RecordingPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryPublisher for RecordingPublisher {
    fn publish_count(&mut self, count: u32) -> Result<()> {
        self.record(TelemetryEvent::Count(count));
        Ok(())
    }

    fn publish_total(&mut self, total: u64) -> Result<()> {
        self.record(TelemetryEvent::Total(total));
        Ok(())
    }

    fn publish_duration(&mut self, event: &DurationEvent) -> Result<()> {
        self.record(TelemetryEvent::Duration(event.seconds));
        Ok(())
    }

    fn disconnect(self: Box<Self>) -> Result<()> {
        *self.disconnected.lock().expect("recording lock") = true;
        Ok(())
    }
}
