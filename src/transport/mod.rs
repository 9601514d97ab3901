//! Transport implementations.
//!
//! Each factory returns a [`BrokerHandles`] pair: the resolver the publish
//! loop asks for an endpoint every cycle, and the publisher it hands that
//! endpoint to. Disabled transports are represented by stubs that fail with
//! [`SimError::Transport`], so callers never need their own `cfg` gates.

mod memory;
mod static_resolver;

#[cfg(feature = "transport_rumqttc")]
mod rumqttc;

use std::sync::Arc;

use crate::{
    // ---
    BrokerHandles,
    ResolverPtr,
    Result,
    SimError,
    TransportConfig,
};

pub use memory::{MemoryBroker, PublishedMessage, DEFAULT_JOURNAL_CAPACITY};
pub use static_resolver::StaticResolver;

#[cfg(feature = "transport_rumqttc")]
pub use self::rumqttc::{BrokerAddr, RumqttcPublisher, DEFAULT_DELIVERY_TIMEOUT};

/// Create the in-process transport.
///
/// Without an endpoint template the broker resolves `memory://<region>`
/// itself; with one, a [`StaticResolver`] renders the template instead.
pub async fn create_memory_transport(config: TransportConfig) -> Result<BrokerHandles> {
    // ---
    let broker = MemoryBroker::new();
    let resolver: ResolverPtr = match config.endpoint {
        Some(template) => Arc::new(StaticResolver::new(template)),
        None => broker.resolver(),
    };

    crate::log_debug!("{}: memory transport ready", config.client_id);

    Ok(BrokerHandles {
        resolver,
        publisher: broker.publisher(),
    })
}

/// Create the MQTT transport backed by rumqttc.
///
/// Requires an endpoint template; there is no managed lookup service here.
#[cfg(feature = "transport_rumqttc")]
pub async fn create_rumqttc_transport(config: TransportConfig) -> Result<BrokerHandles> {
    // ---
    let template = config
        .endpoint
        .clone()
        .ok_or_else(|| SimError::MissingConfig("endpoint".into()))?;

    let publisher = self::rumqttc::create_publisher(config).await?;

    Ok(BrokerHandles {
        resolver: Arc::new(StaticResolver::new(template)),
        publisher,
    })
}

#[cfg(not(feature = "transport_rumqttc"))]
pub async fn create_rumqttc_transport(_config: TransportConfig) -> Result<BrokerHandles> {
    Err(SimError::Transport(
        "transport_rumqttc feature is not enabled".into(),
    ))
}
