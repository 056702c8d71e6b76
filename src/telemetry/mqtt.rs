//! MQTT telemetry publisher.
//!
//! rumqttc's synchronous client needs its `Connection` iterated for outgoing
//! publishes to make progress, so the publisher drives it from a background
//! thread that is joined on disconnect.

use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use rumqttc::v5::{mqttbytes::QoS, Client, Connection, Event, MqttOptions};

use crate::occupancy::DurationEvent;
use crate::telemetry::{CountPayload, DurationPayload, TelemetryPublisher, TotalPayload};

const DEFAULT_BROKER_ADDR: &str = "127.0.0.1:3001";
const DEFAULT_CLIENT_ID: &str = "peopled";
const DEFAULT_KEEPALIVE_SECS: u64 = 60;
const DEFAULT_OCCUPANCY_TOPIC: &str = "person";
const DEFAULT_DURATION_TOPIC: &str = "person/duration";

/// Broker connection settings.
#[derive(Clone, Debug)]
pub struct MqttSettings {
    /// Broker address as host:port.
    pub broker_addr: String,
    pub client_id: String,
    pub keepalive_secs: u64,
    /// Topic carrying count and total payloads.
    pub occupancy_topic: String,
    /// Topic carrying duration payloads.
    pub duration_topic: String,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            broker_addr: DEFAULT_BROKER_ADDR.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            keepalive_secs: DEFAULT_KEEPALIVE_SECS,
            occupancy_topic: DEFAULT_OCCUPANCY_TOPIC.to_string(),
            duration_topic: DEFAULT_DURATION_TOPIC.to_string(),
        }
    }
}

/// Telemetry publisher backed by an MQTT broker.
pub struct MqttPublisher {
    client: Client,
    settings: MqttSettings,
    connection_handle: Option<JoinHandle<()>>,
}

impl MqttPublisher {
    /// Connect to the broker and start the connection event loop.
    pub fn connect(settings: MqttSettings) -> Result<Self> {
        let (host, port) = split_broker_addr(&settings.broker_addr)?;
        let mut options = MqttOptions::new(settings.client_id.clone(), host, port);
        options.set_keep_alive(Duration::from_secs(settings.keepalive_secs));

        let (client, connection) = Client::new(options, 64);
        let handle = spawn_connection_loop(connection);

        log::info!("telemetry connected to mqtt broker {}", settings.broker_addr);
        Ok(Self {
            client,
            settings,
            connection_handle: Some(handle),
        })
    }

    fn publish_json<T: serde::Serialize>(&mut self, topic: &str, payload: &T) -> Result<()> {
        let body = serde_json::to_vec(payload).context("serialize telemetry payload")?;
        self.client
            .publish(topic, QoS::AtMostOnce, false, body)
            .with_context(|| format!("publish to {}", topic))?;
        Ok(())
    }
}

impl TelemetryPublisher for MqttPublisher {
    fn publish_count(&mut self, count: u32) -> Result<()> {
        let topic = self.settings.occupancy_topic.clone();
        self.publish_json(&topic, &CountPayload { count })
    }

    fn publish_total(&mut self, total: u64) -> Result<()> {
        let topic = self.settings.occupancy_topic.clone();
        self.publish_json(&topic, &TotalPayload { total })
    }

    fn publish_duration(&mut self, event: &DurationEvent) -> Result<()> {
        let topic = self.settings.duration_topic.clone();
        self.publish_json(
            &topic,
            &DurationPayload {
                duration: event.seconds,
            },
        )
    }

    fn disconnect(mut self: Box<Self>) -> Result<()> {
        self.client.disconnect()?;
        if let Some(handle) = self.connection_handle.take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

fn spawn_connection_loop(mut connection: Connection) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(_)) | Ok(Event::Outgoing(_)) => {}
                Err(e) => {
                    log::warn!("mqtt connection error: {}", e);
                    break;
                }
            }
        }
    })
}

fn split_broker_addr(addr: &str) -> Result<(String, u16)> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("broker address '{}' must be host:port", addr))?;
    if host.is_empty() {
        return Err(anyhow!("broker address '{}' has an empty host", addr));
    }
    let port: u16 = port
        .parse()
        .map_err(|_| anyhow!("broker address '{}' has an invalid port", addr))?;
    Ok((host.to_string(), port))
}
