//! Simulated IoT device telemetry over a pub/sub broker
//!
//! This library generates randomized sensor and vehicle readings and publishes
//! them as JSON to a broker on a fixed interval. It handles topic rotation,
//! per-attempt endpoint resolution, failure isolation between cycles, and
//! cooperative cancellation with a final summary.
//!
//! The broker itself is behind two traits, [`EndpointResolver`] and
//! [`MessagePublisher`], so the loop runs unchanged against the in-process
//! [`MemoryBroker`] or an MQTT broker.

// Import all sub modules once...
pub mod generator;

mod domain;
mod error;
mod loop_builder;
mod macros;
mod publish_loop;
mod rotator;
mod sim_config;
mod status;
mod transport;
mod transport_builder;

pub(crate) use macros::{log_debug, log_error, log_info, log_warn};

// Re-export main types
pub use error::{Result, SimError};
pub use loop_builder::PublishLoopBuilder;
pub use publish_loop::{PublishLoop, PUBLISH_QOS};
pub use rotator::{vehicle_kind_of, TopicRotator};
pub use self_test::{run_self_test, sample_payloads, SelfTestReport, SELF_TEST_MESSAGE};
pub use sim_config::{
    //
    EndpointPolicy,
    SimConfig,
    SimMode,
    DEFAULT_DEVICE_ID,
    DEFAULT_REGION,
    DEFAULT_SENSOR_TOPIC,
    DEFAULT_VEHICLE_TOPICS,
};
pub use status::{CycleOutcome, FailureKind, RunSummary, StatusReport};
pub use transport_builder::TransportBuilder;

pub use transport::{
    //
    create_memory_transport,
    create_rumqttc_transport,
    MemoryBroker,
    DEFAULT_JOURNAL_CAPACITY,
    PublishedMessage,
    StaticResolver,
};

#[cfg(feature = "transport_rumqttc")]
pub use transport::{BrokerAddr, RumqttcPublisher, DEFAULT_DELIVERY_TIMEOUT};

// --- public re-exports
pub use domain::{
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
