//! MQTT telemetry subscriber.
//!
//! Connects to the biotec broker, subscribes to the per-device status
//! topic and streams decoded frames through a [`tokio::sync::broadcast`]
//! channel. Every frame is also folded into a cumulative live map.
//!
//! Reconnection is left to `rumqttc`: polling the event loop again after an
//! error re-dials the broker. The subscription is re-issued on every CONNACK.
//!
//! # Example
//!
//! ```rust,ignore
//! use centro_api::telemetry::{BrokerConfig, TelemetryHandle};
//! use tokio_util::sync::CancellationToken;
//!
//! let handle = TelemetryHandle::connect(BrokerConfig::new("AD53C83A"), CancellationToken::new());
//! let mut rx = handle.subscribe();
//!
//! while let Ok(update) = rx.recv().await {
//!     println!("{} fields on {}", update.fields.len(), update.topic);
//! }
//!
//! handle.disconnect().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::value::{ParamMap, decode_flat_object};

// ── Channel capacities ───────────────────────────────────────────────

const UPDATE_CHANNEL_CAPACITY: usize = 256;
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// How long `disconnect` waits for the DISCONNECT packet to go out.
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

/// Status topic of one boiler.
pub fn topic_for(device_id: &str) -> String {
    format!("cm/inst/biotec/{device_id}")
}

// ── BrokerConfig ─────────────────────────────────────────────────────

/// Connection settings for the telemetry broker.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Physical unit identifier; selects the topic.
    pub device_id: String,
    pub keep_alive: Duration,
    /// Pause between event-loop polls after a connection error.
    pub reconnect_delay: Duration,
}

impl BrokerConfig {
    pub const DEFAULT_HOST: &'static str = "136.243.62.164";
    pub const DEFAULT_PORT: u16 = 1883;
    pub const DEFAULT_USERNAME: &'static str = "appuser";
    pub const DEFAULT_PASSWORD: &'static str = "appuser";

    /// Settings for the vendor broker and the given device.
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            host: Self::DEFAULT_HOST.into(),
            port: Self::DEFAULT_PORT,
            username: Self::DEFAULT_USERNAME.into(),
            password: SecretString::from(Self::DEFAULT_PASSWORD.to_owned()),
            device_id: device_id.into(),
            keep_alive: Duration::from_secs(60),
            reconnect_delay: Duration::from_secs(5),
        }
    }

    pub fn topic(&self) -> String {
        topic_for(&self.device_id)
    }

    fn mqtt_options(&self) -> MqttOptions {
        let client_id = format!("centro-{}-{}", self.device_id, std::process::id());
        let mut options = MqttOptions::new(client_id, self.host.clone(), self.port);
        options
            .set_credentials(self.username.clone(), self.password.expose_secret())
            .set_keep_alive(self.keep_alive)
            .set_clean_session(true);
        options
    }
}

// ── TelemetryUpdate ──────────────────────────────────────────────────

/// One decoded telemetry frame.
#[derive(Debug, Clone)]
pub struct TelemetryUpdate {
    pub topic: String,
    /// Only the keys carried by this frame.
    pub fields: ParamMap,
    pub received_at: DateTime<Utc>,
}

// ── TelemetryHandle ──────────────────────────────────────────────────

/// Handle to a running telemetry subscription.
pub struct TelemetryHandle {
    client: AsyncClient,
    live: Arc<ArcSwap<ParamMap>>,
    update_rx: broadcast::Receiver<Arc<TelemetryUpdate>>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TelemetryHandle {
    /// Spawn the broker loop and return immediately.
    ///
    /// Connection failures are logged, never returned: the portal pull
    /// path covers for a missing feed. Must be called inside a Tokio
    /// runtime.
    pub fn connect(config: BrokerConfig, cancel: CancellationToken) -> Self {
        let (update_tx, update_rx) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let (client, eventloop) =
            AsyncClient::new(config.mqtt_options(), REQUEST_CHANNEL_CAPACITY);
        let live = Arc::new(ArcSwap::from_pointee(ParamMap::new()));

        tracing::info!(
            host = %config.host,
            port = config.port,
            topic = %config.topic(),
            "starting telemetry subscriber"
        );

        let task = tokio::spawn(mqtt_loop(
            eventloop,
            client.clone(),
            config.topic(),
            Arc::clone(&live),
            update_tx,
            config.reconnect_delay,
            cancel.clone(),
        ));

        Self {
            client,
            live,
            update_rx,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    /// New receiver for decoded frames.
    ///
    /// A receiver that falls behind gets
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TelemetryUpdate>> {
        self.update_rx.resubscribe()
    }

    /// Every key received so far, newest value per key.
    pub fn live(&self) -> Arc<ParamMap> {
        self.live.load_full()
    }

    /// Release the subscription and the broker connection.
    pub async fn disconnect(&self) {
        if let Err(e) = self.client.try_disconnect() {
            tracing::debug!(error = %e, "could not queue MQTT disconnect");
        }

        let Some(mut task) = self.task.lock().await.take() else {
            return;
        };

        if tokio::time::timeout(DISCONNECT_GRACE, &mut task).await.is_err() {
            self.cancel.cancel();
            let _ = task.await;
        }
        tracing::info!("telemetry subscriber disconnected");
    }
}

// ── Background loop ──────────────────────────────────────────────────

async fn mqtt_loop(
    mut eventloop: EventLoop,
    client: AsyncClient,
    topic: String,
    live: Arc<ArcSwap<ParamMap>>,
    update_tx: broadcast::Sender<Arc<TelemetryUpdate>>,
    reconnect_delay: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!("connected to telemetry broker");
                    match client.try_subscribe(topic.clone(), QoS::AtMostOnce) {
                        Ok(()) => tracing::info!(topic = %topic, "subscribed"),
                        Err(e) => tracing::warn!(error = %e, topic = %topic, "subscribe failed"),
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    ingest(&publish.topic, &publish.payload, &live, &update_tx);
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    tracing::warn!("broker closed the connection, reconnecting");
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "telemetry connection error, reconnecting");
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(reconnect_delay) => {}
                    }
                }
            }
        }
    }

    tracing::debug!("telemetry loop exiting");
}

// ── Message handling ─────────────────────────────────────────────────

/// Decode one payload, fold it into the live map and broadcast it.
///
/// Undecodable payloads are logged and dropped. Returns whether the frame
/// was accepted.
pub(crate) fn ingest(
    topic: &str,
    payload: &[u8],
    live: &ArcSwap<ParamMap>,
    update_tx: &broadcast::Sender<Arc<TelemetryUpdate>>,
) -> bool {
    let Ok(text) = std::str::from_utf8(payload) else {
        tracing::warn!(topic, "discarding non UTF-8 telemetry payload");
        return false;
    };

    let fields = match decode_flat_object(text) {
        Ok(fields) => fields,
        Err(e) => {
            tracing::warn!(error = %e, topic, "discarding undecodable telemetry payload");
            return false;
        }
    };

    tracing::debug!(topic, count = fields.len(), "telemetry frame received");

    live.rcu(|current| {
        let mut next = ParamMap::clone(current);
        next.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        next
    });

    // No subscribers is fine; the live map still advanced.
    let _ = update_tx.send(Arc::new(TelemetryUpdate {
        topic: topic.to_owned(),
        fields,
        received_at: Utc::now(),
    }));
    true
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::value::FieldValue;

    fn harness() -> (
        ArcSwap<ParamMap>,
        broadcast::Sender<Arc<TelemetryUpdate>>,
        broadcast::Receiver<Arc<TelemetryUpdate>>,
    ) {
        let (tx, rx) = broadcast::channel(16);
        (ArcSwap::from_pointee(ParamMap::new()), tx, rx)
    }

    #[test]
    fn topic_is_addressed_by_device() {
        assert_eq!(topic_for("AD53C83A"), "cm/inst/biotec/AD53C83A");
        assert_eq!(BrokerConfig::new("X1").topic(), "cm/inst/biotec/X1");
    }

    #[test]
    fn default_broker_settings() {
        let config = BrokerConfig::new("X1");
        assert_eq!(config.port, 1883);
        assert_eq!(config.username, "appuser");
        assert_eq!(config.keep_alive, Duration::from_secs(60));
    }

    #[test]
    fn frame_is_merged_and_broadcast() {
        let (live, tx, mut rx) = harness();

        assert!(ingest("t", br#"{"B_Tk1": 62.5, "B_fan": 0}"#, &live, &tx));

        let update = rx.try_recv().unwrap();
        assert_eq!(update.topic, "t");
        assert_eq!(update.fields["B_Tk1"], FieldValue::Number(62.5));
        assert_eq!(live.load()["B_fan"], FieldValue::Number(0.0));
    }

    #[test]
    fn newer_frames_overwrite_older_keys() {
        let (live, tx, _rx) = harness();

        ingest("t", br#"{"B_Tk1": 60, "B_Tptv1": 45}"#, &live, &tx);
        ingest("t", br#"{"B_Tk1": 63}"#, &live, &tx);

        let map = live.load_full();
        assert_eq!(map["B_Tk1"], FieldValue::Number(63.0));
        assert_eq!(map["B_Tptv1"], FieldValue::Number(45.0));
    }

    #[test]
    fn repeated_frame_is_idempotent() {
        let (live, tx, _rx) = harness();

        ingest("t", br#"{"B_STATE": "ON"}"#, &live, &tx);
        let once = live.load_full();
        ingest("t", br#"{"B_STATE": "ON"}"#, &live, &tx);

        assert_eq!(*once, **live.load());
    }

    #[test]
    fn malformed_payload_is_discarded() {
        let (live, tx, mut rx) = harness();

        assert!(!ingest("t", b"{not json", &live, &tx));
        assert!(!ingest("t", &[0xff, 0xfe], &live, &tx));

        assert!(rx.try_recv().is_err());
        assert!(live.load().is_empty());
    }
}
