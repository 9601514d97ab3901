//! Domain layer public interface.
//!
//! This module defines domain-level abstractions that are independent of
//! concrete brokers, endpoint lookup services, or client libraries.
//!
//! All domain consumers must import symbols via this module, not by
//! referencing individual files directly.

mod broker;

// --- Broker domain re-exports ---

pub use broker::{
    //
    BrokerHandles,
    Endpoint,
    EndpointResolver,
    MessagePublisher,
    PublisherPtr,
    QoS,
    ResolverPtr,
    Topic,
    TransportConfig,
};
