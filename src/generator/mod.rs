//! Synthetic telemetry generation.
//!
//! Free functions produce one reading from any [`rand::Rng`]; the
//! [`ReadingGenerator`] implementations own a seedable RNG and are what the
//! publish loop drives, one call per cycle.
//!
//! Every call re-samples every field uniformly within its declared interval.
//! Nothing is cached between calls.

mod reading;
mod sensor;
mod vehicle;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;

use crate::domain::Topic;

pub use reading::{
    //
    Location,
    Reading,
    SensorReading,
    TirePressure,
    VehicleExtension,
    VehicleReading,
};
pub use sensor::generate_sensor_reading;
pub use vehicle::{generate_vehicle_reading, VehicleKind};

pub const LATITUDE: RangeInclusive<f64> = 37.4..=37.6;
pub const LONGITUDE: RangeInclusive<f64> = 126.8..=127.2;

/// Device class a reading is generated for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceKind {
    /// Generic environmental sensor.
    Sensor,
    /// Vehicle of the given type string; unknown strings get no extension.
    Vehicle(String),
}

/// Generate one reading of the given kind.
pub fn generate<R>(rng: &mut R, device_id: &str, kind: &DeviceKind) -> Reading
where
    R: Rng + ?Sized,
{
    // ---
    match kind {
        DeviceKind::Sensor => Reading::Sensor(generate_sensor_reading(rng, device_id)),
        DeviceKind::Vehicle(vehicle_type) => {
            Reading::Vehicle(generate_vehicle_reading(rng, device_id, vehicle_type))
        }
    }
}

/// Source of readings driven by the publish loop.
///
/// Called once per cycle with the topic selected for that cycle.
pub trait ReadingGenerator: Send {
    /// Produce a fresh reading destined for `topic`.
    fn generate(&mut self, topic: &Topic) -> Reading;

    /// Device kind produced for `topic`.
    fn kind_for(&self, topic: &Topic) -> DeviceKind;
}

/// Generic sensor generator. The topic does not influence the reading.
pub struct SensorGenerator {
    device_id: String,
    rng: StdRng,
}

impl SensorGenerator {
    /// Generator seeded from OS entropy.
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Generator with a fixed seed, for reproducible runs.
    pub fn with_seed(device_id: impl Into<String>, seed: u64) -> Self {
        Self {
            device_id: device_id.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ReadingGenerator for SensorGenerator {
    fn generate(&mut self, topic: &Topic) -> Reading {
        let kind = self.kind_for(topic);
        generate(&mut self.rng, &self.device_id, &kind)
    }

    fn kind_for(&self, _topic: &Topic) -> DeviceKind {
        DeviceKind::Sensor
    }
}

/// Vehicle generator. The vehicle type is the topic's last path segment.
pub struct VehicleGenerator {
    device_id: String,
    rng: StdRng,
}

impl VehicleGenerator {
    /// Generator seeded from OS entropy.
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Generator with a fixed seed, for reproducible runs.
    pub fn with_seed(device_id: impl Into<String>, seed: u64) -> Self {
        Self {
            device_id: device_id.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ReadingGenerator for VehicleGenerator {
    fn generate(&mut self, topic: &Topic) -> Reading {
        let kind = self.kind_for(topic);
        generate(&mut self.rng, &self.device_id, &kind)
    }

    fn kind_for(&self, topic: &Topic) -> DeviceKind {
        DeviceKind::Vehicle(crate::rotator::vehicle_kind_of(topic).to_string())
    }
}

/// Round half away from zero to `places` decimals.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

pub(crate) fn sample_location<R>(rng: &mut R) -> Location
where
    R: Rng + ?Sized,
{
    Location {
        latitude: round_to(rng.gen_range(LATITUDE), 6),
        longitude: round_to(rng.gen_range(LONGITUDE), 6),
    }
}
