//! MQTT publisher implementation based on rumqttc.
//!
//! This module adapts the rumqttc API to the domain-level `MessagePublisher`
//! trait without leaking MQTT types upward.
//!
//! # Features
//!
//! - One broker connection per resolved endpoint, replaced when the endpoint
//!   changes between cycles
//! - Background task owning the rumqttc `EventLoop`
//! - Acknowledged publish: success means the broker returned a PUBACK
//!   (or PUBCOMP) within a bounded delivery timeout
//!
//! # Usage
//!
//! Enable the `transport_rumqttc` feature:
//!
//! ```toml
//! [dependencies]
//! iot-telemetry-sim = { version = "0.1", features = ["transport_rumqttc"] }
//! ```

mod publisher;
pub use publisher::{create_publisher, BrokerAddr, RumqttcPublisher, DEFAULT_DELIVERY_TIMEOUT};
