//! MQTT publisher using `rumqttc`.
//!
//! ## Connection model
//!
//! The publish loop hands every call the endpoint it just resolved. The
//! publisher keeps at most one live connection, keyed by that endpoint:
//!
//! - same endpoint as last time → reuse the connection,
//! - different endpoint → disconnect the old client, stop its event loop
//!   task, and connect to the new one.
//!
//! Each connection has a background task that owns the rumqttc `EventLoop`
//! and polls it until the connection is replaced or closed. Connecting is
//! lazy: the TCP/TLS handshake happens when that task first polls.
//!
//! ## Delivery semantics
//!
//! `publish()` succeeds only once the broker has taken the message:
//!
//! 1. wait until the event loop has seen a successful CONNACK,
//! 2. hand the message to the client and note the packet id the event loop
//!    sends it under,
//! 3. for QoS 1 / 2, wait for the PUBACK / PUBCOMP carrying that packet id.
//!
//! All three steps share one deadline (5 s unless overridden with
//! [`RumqttcPublisher::with_delivery_timeout`]). Missing it, or losing the
//! connection, is a [`SimError::Publish`] for that cycle. QoS 0 stops after
//! step 2.

use bytes::Bytes;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet,
    Transport as MqttTransport,
};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::{
    // ---
    Endpoint,
    MessagePublisher,
    PublisherPtr,
    QoS,
    Result,
    SimError,
    Topic,
    TransportConfig,
};

const RECONNECT_DELAY: Duration = Duration::from_secs(2);
const REQUEST_CAPACITY: usize = 64;
const MIN_KEEP_ALIVE_SECS: u16 = 5;
const DEFAULT_KEEP_ALIVE_SECS: u16 = 30;

/// Deadline for connect + hand-off + acknowledgement of one message.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Host, port and TLS flag parsed from an endpoint string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddr {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

impl BrokerAddr {
    /// Parse `mqtt://host[:port]`, `mqtts://`, `ssl://`, `tcp://`, `https://`
    /// or a bare `host[:port]`.
    ///
    /// Plain schemes default to port 1883, TLS schemes (and bare hosts, which
    /// is what managed lookup services return) to 8883.
    pub fn parse(endpoint: &str) -> Result<Self> {
        // ---
        let endpoint = endpoint.trim();
        let (tls, rest) = match endpoint.split_once("://") {
            Some(("mqtt" | "tcp", rest)) => (false, rest),
            Some(("mqtts" | "ssl" | "https", rest)) => (true, rest),
            Some((scheme, _)) => {
                return Err(SimError::Transport(format!(
                    "unsupported endpoint scheme: {scheme}"
                )))
            }
            None => (true, endpoint),
        };

        let rest = rest.trim_end_matches('/');
        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| SimError::Transport(format!("invalid port in endpoint: {endpoint}")))?;
                (host, port)
            }
            None => (rest, if tls { 8883 } else { 1883 }),
        };

        if host.is_empty() {
            return Err(SimError::Transport(format!(
                "endpoint has no host: {endpoint}"
            )));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            tls,
        })
    }
}

/// Packet-level progress reported by the event loop task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Sent(u16),
    Acked(u16),
}

struct Connection {
    endpoint: Endpoint,
    client: AsyncClient,
    connected: watch::Receiver<bool>,
    deliveries: mpsc::Receiver<Delivery>,
    task: JoinHandle<()>,
}

/// rumqttc-backed implementation of [`MessagePublisher`].
pub struct RumqttcPublisher {
    // ---
    client_id: String,
    keep_alive: Duration,
    delivery_timeout: Duration,
    connection: Mutex<Option<Connection>>,
}

impl RumqttcPublisher {
    /// Create a publisher; no connection is made until the first publish.
    pub fn new(client_id: impl Into<String>, keep_alive_secs: Option<u16>) -> Self {
        // ---
        let secs = keep_alive_secs
            .unwrap_or(DEFAULT_KEEP_ALIVE_SECS)
            .max(MIN_KEEP_ALIVE_SECS);

        Self {
            client_id: client_id.into(),
            keep_alive: Duration::from_secs(u64::from(secs)),
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            connection: Mutex::new(None),
        }
    }

    /// Override how long one publish may wait for the broker.
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    fn connect(&self, endpoint: &Endpoint) -> Result<Connection> {
        // ---
        let addr = BrokerAddr::parse(endpoint.as_str())?;

        let mut options = MqttOptions::new(self.client_id.clone(), addr.host.clone(), addr.port);
        options.set_keep_alive(self.keep_alive);
        if addr.tls {
            options.set_transport(MqttTransport::tls_with_default_config());
        }

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let (connected_tx, connected) = watch::channel(false);
        let (delivery_tx, deliveries) = mpsc::channel(REQUEST_CAPACITY);
        let task = tokio::spawn(drive_event_loop(
            endpoint.clone(),
            event_loop,
            connected_tx,
            delivery_tx,
        ));

        crate::log_info!(
            "{}: connecting to {}:{} (tls={})",
            self.client_id,
            addr.host,
            addr.port,
            addr.tls
        );

        Ok(Connection {
            endpoint: endpoint.clone(),
            client,
            connected,
            deliveries,
            task,
        })
    }

    /// Queue a DISCONNECT without waiting on a possibly full request channel,
    /// then stop the event loop task.
    fn disconnect(&self, connection: Connection) {
        // ---
        if let Err(_err) = connection.client.try_disconnect() {
            crate::log_debug!(
                "{}: disconnect from {} failed: {_err}",
                self.client_id,
                connection.endpoint
            );
        }
        connection.task.abort();
    }
}

/// Poll the event loop until the task is aborted, publishing connection
/// state and packet progress to the owning [`Connection`].
async fn drive_event_loop(
    endpoint: Endpoint,
    mut event_loop: EventLoop,
    connected: watch::Sender<bool>,
    deliveries: mpsc::Sender<Delivery>,
) {
    // ---
    let forward = |delivery: Delivery| {
        // Nobody is waiting when the queue is full; the next publish drains it.
        if let Err(_err) = deliveries.try_send(delivery) {
            crate::log_debug!("{endpoint}: dropped {delivery:?}: {_err}");
        }
    };

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                let accepted = connack.code == ConnectReturnCode::Success;
                crate::log_info!("{endpoint}: connack ({:?})", connack.code);
                connected.send_replace(accepted);
            }
            Ok(Event::Outgoing(Outgoing::Publish(pkid))) => forward(Delivery::Sent(pkid)),
            Ok(Event::Incoming(Packet::PubAck(puback))) => forward(Delivery::Acked(puback.pkid)),
            Ok(Event::Incoming(Packet::PubComp(pubcomp))) => {
                forward(Delivery::Acked(pubcomp.pkid))
            }
            Ok(_event) => {
                crate::log_debug!("{endpoint}: mqtt event (ignored): {:?}", _event);
            }
            Err(_err) => {
                connected.send_replace(false);
                crate::log_error!("{endpoint}: mqtt connection error: {_err}");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

/// Connect, hand off and (for QoS > 0) await the broker acknowledgement.
async fn deliver(
    conn: &mut Connection,
    topic: &Topic,
    qos: rumqttc::QoS,
    payload: Bytes,
) -> Result<()> {
    // ---
    let endpoint = conn.endpoint.clone();
    let lost = || SimError::Publish(format!("{topic}: connection to {endpoint} lost"));

    if conn.connected.wait_for(|up| *up).await.is_err() {
        return Err(lost());
    }

    // Progress left over from an earlier, abandoned publish.
    while conn.deliveries.try_recv().is_ok() {}

    conn.client
        .publish(topic.as_str(), qos, false, payload.to_vec())
        .await
        .map_err(|err| SimError::Publish(format!("{topic}: {err}")))?;

    let pkid = loop {
        match conn.deliveries.recv().await {
            Some(Delivery::Sent(pkid)) => break pkid,
            Some(Delivery::Acked(_)) => continue,
            None => return Err(lost()),
        }
    };

    if qos == rumqttc::QoS::AtMostOnce {
        return Ok(());
    }

    loop {
        match conn.deliveries.recv().await {
            Some(Delivery::Acked(acked)) if acked == pkid => return Ok(()),
            Some(_) => continue,
            None => return Err(lost()),
        }
    }
}

fn to_mqtt_qos(qos: QoS) -> rumqttc::QoS {
    match qos {
        QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
        QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

#[async_trait::async_trait]
impl MessagePublisher for RumqttcPublisher {
    // ---
    async fn publish(
        &self,
        endpoint: &Endpoint,
        topic: &Topic,
        qos: QoS,
        payload: Bytes,
    ) -> Result<()> {
        // ---
        let mut guard = self.connection.lock().await;

        let stale = matches!(&*guard, Some(conn) if conn.endpoint != *endpoint);
        if stale {
            if let Some(old) = guard.take() {
                crate::log_info!(
                    "{}: endpoint changed {} → {endpoint}, reconnecting",
                    self.client_id,
                    old.endpoint
                );
                self.disconnect(old);
            }
        }

        if guard.is_none() {
            *guard = Some(self.connect(endpoint)?);
        }

        let Some(conn) = guard.as_mut() else {
            return Err(SimError::Publish("no broker connection".into()));
        };

        let delivery = deliver(conn, topic, to_mqtt_qos(qos), payload);
        match tokio::time::timeout(self.delivery_timeout, delivery).await {
            Ok(result) => result,
            Err(_) => Err(SimError::Publish(format!(
                "{topic}: not delivered to {endpoint} within {:?}",
                self.delivery_timeout
            ))),
        }
    }

    async fn close(&self) -> Result<()> {
        // ---
        if let Some(conn) = self.connection.lock().await.take() {
            self.disconnect(conn);
        }
        Ok(())
    }
}

/// Create a rumqttc publisher from transport settings.
pub async fn create_publisher(config: TransportConfig) -> Result<PublisherPtr> {
    // ---
    let client_id = config.client_id.clone();
    Ok(std::sync::Arc::new(RumqttcPublisher::new(
        client_id,
        config.keep_alive_secs,
    )))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_parse_schemes() {
        // ---
        assert_eq!(
            BrokerAddr::parse("mqtt://localhost:1884").unwrap(),
            BrokerAddr {
                host: "localhost".into(),
                port: 1884,
                tls: false
            }
        );
        assert_eq!(BrokerAddr::parse("mqtt://localhost").unwrap().port, 1883);
        assert_eq!(BrokerAddr::parse("mqtts://broker.example.com").unwrap().port, 8883);

        let bare = BrokerAddr::parse("abc-ats.iot.ap-northeast-2.amazonaws.com").unwrap();
        assert!(bare.tls);
        assert_eq!(bare.port, 8883);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        // ---
        assert!(BrokerAddr::parse("amqp://host").is_err());
        assert!(BrokerAddr::parse("mqtt://:1883").is_err());
        assert!(BrokerAddr::parse("mqtt://host:notaport").is_err());
    }

    #[tokio::test]
    async fn test_publish_without_broker_fails() {
        // ---
        // Nothing listens on port 1, so no CONNACK ever arrives.
        let publisher = RumqttcPublisher::new("sim-test-unreachable", None)
            .with_delivery_timeout(Duration::from_millis(200));
        let endpoint = Endpoint::from("mqtt://127.0.0.1:1");
        let topic = Topic::from("topic/test");

        for qos in [QoS::AtLeastOnce, QoS::AtLeastOnce, QoS::AtMostOnce] {
            let result = publisher
                .publish(&endpoint, &topic, qos, Bytes::from_static(b"{}"))
                .await;
            assert!(matches!(result, Err(SimError::Publish(_))), "{qos:?}: {result:?}");
        }

        publisher.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_endpoint_fails_without_connecting() {
        // ---
        let publisher = RumqttcPublisher::new("sim-test-bad-endpoint", None);
        let result = publisher
            .publish(
                &Endpoint::from("amqp://127.0.0.1"),
                &Topic::from("topic/test"),
                QoS::AtLeastOnce,
                Bytes::from_static(b"{}"),
            )
            .await;

        assert!(matches!(result, Err(SimError::Transport(_))));
        assert!(publisher.connection.lock().await.is_none());
    }
}
