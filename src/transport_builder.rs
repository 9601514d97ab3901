//! Transport builder for creating resolver/publisher pairs.
//!
//! Provides a fluent builder API for choosing a transport and its connection
//! settings, separate from the simulation settings in [`SimConfig`](crate::SimConfig).

use uuid::Uuid;

use crate::{
    // ---
    BrokerHandles,
    Result,
    SimError,
    TransportConfig,
};

/// Builder for creating transport instances.
///
/// # Examples
///
/// ## In-process broker
/// ```no_run
/// use iot_telemetry_sim::TransportBuilder;
///
/// # async fn example() -> iot_telemetry_sim::Result<()> {
/// let handles = TransportBuilder::new()
///     .client_id("test-psw0507")
///     .transport_type("memory")
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// ## MQTT broker with a region template
/// ```no_run
/// use iot_telemetry_sim::TransportBuilder;
///
/// # async fn example() -> iot_telemetry_sim::Result<()> {
/// let handles = TransportBuilder::new()
///     .client_id("test-psw0507")
///     .transport_type("rumqttc")
///     .endpoint("mqtts://iot.{region}.example.com:8883")
///     .keep_alive_secs(30)
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct TransportBuilder {
    endpoint: Option<String>,
    client_id: Option<String>,
    transport_type: Option<String>,
    keep_alive_secs: Option<u16>,
}

impl TransportBuilder {
    /// Create a new transport builder.
    pub fn new() -> Self {
        Self {
            endpoint: None,
            client_id: None,
            transport_type: None,
            keep_alive_secs: None,
        }
    }

    /// Set the endpoint template.
    ///
    /// Examples:
    /// - `"mqtt://localhost:1883"`
    /// - `"mqtts://iot.{region}.example.com:8883"` (`{region}` is filled per lookup)
    pub fn endpoint(mut self, template: impl Into<String>) -> Self {
        self.endpoint = Some(template.into());
        self
    }

    /// Set the MQTT client identifier (required).
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Derive a unique client identifier from a device id.
    ///
    /// Brokers drop an existing session when a second client connects with
    /// the same id, so a random suffix keeps concurrent runs apart.
    pub fn client_id_for_device(self, device_id: &str) -> Self {
        // ---
        let suffix = Uuid::new_v4().simple().to_string();
        self.client_id(format!("{device_id}-{}", &suffix[..8]))
    }

    /// Set explicit transport type.
    ///
    /// Valid values: `"memory"`, `"rumqttc"`
    ///
    /// If not specified, rumqttc is tried first when an endpoint is set and
    /// memory is the fallback.
    pub fn transport_type(mut self, flag: impl Into<String>) -> Self {
        self.transport_type = Some(flag.into());
        self
    }

    /// Set broker keep-alive interval in seconds.
    ///
    /// If not specified, uses transport default.
    pub fn keep_alive_secs(mut self, secs: u16) -> Self {
        self.keep_alive_secs = Some(secs);
        self
    }

    /// Build the transport (consumes self).
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `client_id` is missing or empty
    /// - the transport type is unknown or its feature is disabled
    /// - transport creation fails
    pub async fn build(self) -> Result<BrokerHandles> {
        // ---
        let client_id = self
            .client_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| SimError::MissingConfig("client_id".into()))?;

        let config = TransportConfig {
            endpoint: self.endpoint,
            client_id,
            transport_type: self.transport_type.clone(),
            keep_alive_secs: self.keep_alive_secs,
        };

        // Disabled transports return Err via their stubs, so the first Ok() wins
        // when no type is given. Memory is the unconditional fallback.
        match self.transport_type.as_deref() {
            Some("rumqttc") => crate::create_rumqttc_transport(config).await,
            Some("memory") => crate::create_memory_transport(config).await,
            Some(other) => Err(SimError::Transport(format!(
                "unrecognized transport_type: {other}, valid values: memory, rumqttc"
            ))),
            None => {
                if config.endpoint.is_some() {
                    if let Ok(handles) = crate::create_rumqttc_transport(config.clone()).await {
                        return Ok(handles);
                    }
                }
                crate::create_memory_transport(config).await
            }
        }
    }
}

impl Default for TransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
