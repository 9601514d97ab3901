//! Public, transport-agnostic simulator configuration.
//!
//! A [`SimConfig`] is built once at startup and passed by reference to the
//! loop builder, the rotator and the transport builder. Nothing reads
//! configuration from global state.

use std::time::Duration;

use crate::generator::{ReadingGenerator, SensorGenerator, VehicleGenerator};
use crate::{Result, SimError, Topic, TopicRotator};

/// Default broker region.
pub const DEFAULT_REGION: &str = "ap-northeast-2";

/// Default device identifier.
pub const DEFAULT_DEVICE_ID: &str = "test-psw0507";

/// Default topic for the single-device sensor publisher.
pub const DEFAULT_SENSOR_TOPIC: &str = "topic/test";

/// Default topic rotation for the vehicle publisher.
pub const DEFAULT_VEHICLE_TOPICS: [&str; 3] = ["topic/truck", "topic/sedan", "topic/suv"];

/// Which device the simulator impersonates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimMode {
    /// One generic sensor publishing to a single fixed topic every 5 s.
    Sensor,

    /// Three vehicle classes rotating over their topics every 1 s.
    Vehicle,
}

impl SimMode {
    /// Fixed wait between cycles for this mode.
    pub fn default_interval(self) -> Duration {
        match self {
            SimMode::Sensor => Duration::from_secs(5),
            SimMode::Vehicle => Duration::from_secs(1),
        }
    }

    /// Topics used when none are configured explicitly.
    pub fn default_topics(self) -> Vec<Topic> {
        match self {
            SimMode::Sensor => vec![Topic::from(DEFAULT_SENSOR_TOPIC)],
            SimMode::Vehicle => DEFAULT_VEHICLE_TOPICS.iter().map(|t| Topic::from(*t)).collect(),
        }
    }
}

/// When the publish loop asks the resolver for the broker endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointPolicy {
    /// Resolve before every publish attempt.
    #[default]
    ResolveEveryAttempt,

    /// Resolve once and reuse the endpoint until a publish fails.
    CacheAfterFirst,
}

/// Simulator settings.
#[derive(Debug, Clone)]
pub struct SimConfig {
    // ---
    /// Device class to simulate.
    pub mode: SimMode,

    /// Broker region passed to the endpoint resolver.
    pub region: String,

    /// Device identifier stamped on every reading.
    pub device_id: String,

    /// Ordered topic list. Sensor mode uses exactly one topic.
    pub topics: Vec<Topic>,

    /// Wait between cycles.
    pub interval: Duration,

    /// Stop after this many cycles. `None` runs until cancelled.
    pub max_cycles: Option<u64>,

    /// RNG seed for reproducible readings. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Endpoint resolution policy.
    pub endpoint_policy: EndpointPolicy,
}

impl SimConfig {
    /// Defaults for the given mode.
    pub fn new(mode: SimMode) -> Self {
        Self {
            mode,
            region: DEFAULT_REGION.to_string(),
            device_id: DEFAULT_DEVICE_ID.to_string(),
            topics: mode.default_topics(),
            interval: mode.default_interval(),
            max_cycles: None,
            seed: None,
            endpoint_policy: EndpointPolicy::default(),
        }
    }

    /// Single-device sensor defaults.
    pub fn sensor() -> Self {
        Self::new(SimMode::Sensor)
    }

    /// Rotating multi-vehicle defaults.
    pub fn vehicle() -> Self {
        Self::new(SimMode::Vehicle)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    /// Replace the topic list.
    pub fn with_topics<I, T>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Topic>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_endpoint_policy(mut self, policy: EndpointPolicy) -> Self {
        self.endpoint_policy = policy;
        self
    }

    /// Check the settings for contradictions.
    ///
    /// # Errors
    ///
    /// - [`SimError::MissingConfig`] for an empty region, device id or topic list
    /// - [`SimError::ConfigConflict`] for more than one topic in sensor mode
    pub fn validate(&self) -> Result<()> {
        // ---
        if self.region.trim().is_empty() {
            return Err(SimError::MissingConfig("region".into()));
        }
        if self.device_id.trim().is_empty() {
            return Err(SimError::MissingConfig("device_id".into()));
        }
        if self.topics.is_empty() {
            return Err(SimError::MissingConfig("at least one topic".into()));
        }
        if self.mode == SimMode::Sensor && self.topics.len() > 1 {
            return Err(SimError::ConfigConflict(format!(
                "sensor mode publishes to a single topic, got {}",
                self.topics.len()
            )));
        }
        Ok(())
    }

    /// Build the rotator for the configured topic list.
    pub fn rotator(&self) -> Result<TopicRotator> {
        match self.mode {
            SimMode::Sensor => {
                self.validate()?;
                Ok(TopicRotator::single(self.topics[0].clone()))
            }
            SimMode::Vehicle => TopicRotator::new(self.topics.iter().cloned()),
        }
    }

    /// Build the reading generator for the configured mode and seed.
    pub fn generator(&self) -> Box<dyn ReadingGenerator> {
        match (self.mode, self.seed) {
            (SimMode::Sensor, Some(seed)) => Box::new(SensorGenerator::with_seed(&self.device_id, seed)),
            (SimMode::Sensor, None) => Box::new(SensorGenerator::new(&self.device_id)),
            (SimMode::Vehicle, Some(seed)) => {
                Box::new(VehicleGenerator::with_seed(&self.device_id, seed))
            }
            (SimMode::Vehicle, None) => Box::new(VehicleGenerator::new(&self.device_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_mode_defaults() {
        // ---
        let sensor = SimConfig::sensor();
        assert_eq!(sensor.interval, Duration::from_secs(5));
        assert_eq!(sensor.topics, vec![Topic::from("topic/test")]);
        assert_eq!(sensor.region, "ap-northeast-2");
        assert_eq!(sensor.endpoint_policy, EndpointPolicy::ResolveEveryAttempt);

        let vehicle = SimConfig::vehicle();
        assert_eq!(vehicle.interval, Duration::from_secs(1));
        assert_eq!(vehicle.topics.len(), 3);
        assert_eq!(vehicle.topics[2].as_str(), "topic/suv");
    }

    #[test]
    fn test_sensor_mode_rejects_multiple_topics() {
        // ---
        let config = SimConfig::sensor().with_topics(["a", "b"]);
        assert!(matches!(config.validate(), Err(SimError::ConfigConflict(_))));
        assert!(config.rotator().is_err());
    }

    #[test]
    fn test_empty_fields_rejected() {
        // ---
        let no_region = SimConfig::vehicle().with_region(" ");
        assert!(matches!(no_region.validate(), Err(SimError::MissingConfig(_))));

        let no_topics = SimConfig::vehicle().with_topics(Vec::<String>::new());
        assert!(matches!(no_topics.validate(), Err(SimError::MissingConfig(_))));
        assert!(no_topics.rotator().is_err());
    }

    #[test]
    fn test_vehicle_rotator_follows_topic_order() {
        // ---
        let mut rotator = SimConfig::vehicle().rotator().unwrap();
        assert_eq!(rotator.next().as_str(), "topic/truck");
        assert_eq!(rotator.next().as_str(), "topic/sedan");
        assert_eq!(rotator.next().as_str(), "topic/suv");
        assert_eq!(rotator.next().as_str(), "topic/truck");
    }
}
