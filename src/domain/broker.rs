// src/domain/broker.rs

//! Broker domain abstractions.
//!
//! The publish loop talks to the outside world through exactly two seams:
//!
//! - [`EndpointResolver`] looks up the broker's current data-plane address
//!   for a region.
//! - [`MessagePublisher`] delivers one serialized payload to a topic on a
//!   resolved endpoint.
//!
//! Both are external collaborators. Authentication, connection management and
//! endpoint discovery live behind these traits; the loop only sees typed
//! success or failure. Concrete implementations live under `src/transport/`.

use crate::Result;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// A resolved broker data-plane address.
///
/// Interpretation is adapter-specific (`mqtt://host:port`,
/// `memory://region`, ...). The domain layer treats it as opaque.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint(pub Arc<str>);

impl<T> From<T> for Endpoint
where
    T: Into<Arc<str>>,
{
    fn from(value: T) -> Self {
        // ---
        Endpoint(value.into())
    }
}

impl Endpoint {
    /// Borrow the endpoint as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A broker topic a reading is published to.
///
/// Topics are hierarchical, `/`-separated strings such as `topic/truck`.
/// They are immutable and cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Topic(pub Arc<str>);

impl<T> From<T> for Topic
where
    T: Into<Arc<str>>,
{
    fn from(value: T) -> Self {
        // ---
        Topic(value.into())
    }
}

impl Topic {
    /// Borrow the topic as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the topic (`topic/truck` → `truck`).
    ///
    /// A topic without separators is its own last segment.
    pub fn last_segment(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Delivery guarantee requested from the broker.
///
/// The publish loop always uses [`QoS::AtLeastOnce`]; the other levels exist
/// so adapters can map the full range of their client library.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QoS {
    /// Level 0, fire and forget.
    AtMostOnce,
    /// Level 1, acknowledged delivery, duplicates possible.
    AtLeastOnce,
    /// Level 2, exactly-once handshake.
    ExactlyOnce,
}

impl QoS {
    /// Numeric MQTT level of this QoS.
    pub fn level(self) -> u8 {
        match self {
            QoS::AtMostOnce => 0,
            QoS::AtLeastOnce => 1,
            QoS::ExactlyOnce => 2,
        }
    }
}

/// Broker endpoint lookup.
///
/// Called by the publish loop once per publish attempt unless an explicit
/// caching policy is configured. A returned error aborts the current attempt
/// only.
///
/// # Notes
///
/// This trait uses `async_trait`; consumers should treat methods as normal
/// `async fn`s.
#[async_trait::async_trait]
pub trait EndpointResolver: Send + Sync {
    // ---
    /// Resolve the broker data endpoint for `region`.
    ///
    /// Implementations report lookup failures as
    /// [`SimError::EndpointResolution`](crate::SimError::EndpointResolution).
    async fn resolve_data_endpoint(&self, region: &str) -> Result<Endpoint>;
}

/// Broker publish call.
///
/// Implementations must not retry internally; a failed publish is superseded
/// by the next scheduled cycle. Any timeout is the implementation's own.
#[async_trait::async_trait]
pub trait MessagePublisher: Send + Sync {
    // ---
    /// Deliver `payload` to `topic` on `endpoint` with the requested QoS.
    ///
    /// Implementations report delivery failures as
    /// [`SimError::Publish`](crate::SimError::Publish).
    async fn publish(
        &self,
        endpoint: &Endpoint,
        topic: &Topic,
        qos: QoS,
        payload: Bytes,
    ) -> Result<()>;

    /// Release connections held by the publisher.
    ///
    /// Default implementation does nothing.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Shared resolver pointer.
pub type ResolverPtr = Arc<dyn EndpointResolver>;

/// Shared publisher pointer.
///
/// `.clone()` only increments a reference count; clones share the same
/// underlying connection.
pub type PublisherPtr = Arc<dyn MessagePublisher>;

/// A resolver and publisher produced together by one transport factory.
#[derive(Clone)]
pub struct BrokerHandles {
    pub resolver: ResolverPtr,
    pub publisher: PublisherPtr,
}

/// Configuration for creating a transport instance.
///
/// Passed to transport factory functions (`create_*_publisher()`).
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Endpoint template for a static resolver, e.g. `"mqtt://localhost:1883"`.
    /// If `None`, the transport supplies its own resolver.
    pub endpoint: Option<String>,
    /// MQTT client identifier.
    pub client_id: String,
    /// Optional transport type override (`"memory"` or `"rumqttc"`).
    pub transport_type: Option<String>,
    /// Broker keep-alive interval in seconds.
    pub keep_alive_secs: Option<u16>,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_last_segment() {
        // ---
        assert_eq!(Topic::from("topic/truck").last_segment(), "truck");
        assert_eq!(Topic::from("fleet/a/b/suv").last_segment(), "suv");
        assert_eq!(Topic::from("sedan").last_segment(), "sedan");
        assert_eq!(Topic::from("topic/").last_segment(), "");
    }

    #[test]
    fn test_qos_level() {
        // ---
        assert_eq!(QoS::AtMostOnce.level(), 0);
        assert_eq!(QoS::AtLeastOnce.level(), 1);
        assert_eq!(QoS::ExactlyOnce.level(), 2);
    }
}
