// src/generator/reading.rs

//! Telemetry record types.
//!
//! Readings are plain serde data. They are created once per cycle, serialized
//! to compact JSON for publishing, and dropped after the attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One simulated telemetry record.
///
/// Serialized without a tag: the payload is either a sensor object or a
/// vehicle object, exactly as the device would send it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    // ---
    /// Vehicle telemetry, tried first because `vehicle_type` is required.
    Vehicle(VehicleReading),

    /// Generic environmental sensor telemetry.
    Sensor(SensorReading),
}

impl Reading {
    /// Device identifier carried by the reading.
    pub fn device_id(&self) -> &str {
        match self {
            Reading::Vehicle(v) => &v.device_id,
            Reading::Sensor(s) => &s.device_id,
        }
    }

    /// Short human-readable digest used in status logs.
    pub fn summary(&self) -> String {
        match self {
            Reading::Vehicle(v) => format!(
                "{}: fuel {}%, engine {}°C",
                v.vehicle_type.to_uppercase(),
                v.fuel_level,
                v.engine_temperature
            ),
            Reading::Sensor(s) => format!(
                "temp {}°C, humidity {}%, battery {}%",
                s.temperature, s.humidity, s.battery_level
            ),
        }
    }
}

/// Geographic position, 6-decimal precision.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Generic sensor reading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    /// °C
    pub temperature: f64,
    /// %
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    pub location: Location,
    /// %
    pub battery_level: u8,
    /// dBm
    pub signal_strength: i16,

    /// Free-form annotation, only set on self-test messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Tire pressure per wheel, psi.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TirePressure {
    pub front_left: f64,
    pub front_right: f64,
    pub rear_left: f64,
    pub rear_right: f64,
}

impl TirePressure {
    /// All four values in wheel order.
    pub fn values(&self) -> [f64; 4] {
        [
            self.front_left,
            self.front_right,
            self.rear_left,
            self.rear_right,
        ]
    }
}

/// Vehicle reading: shared base fields plus a per-class extension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleReading {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    /// Kind string the reading was generated for, recognized or not.
    pub vehicle_type: String,
    /// °C
    pub engine_temperature: f64,
    /// %
    pub fuel_level: f64,
    pub location: Location,
    /// km
    pub mileage: u32,
    pub tire_pressure: TirePressure,
    /// V
    pub battery_voltage: f64,

    /// Class-specific fields, flattened into the top-level object.
    /// `None` for unrecognized vehicle types.
    #[serde(flatten)]
    pub extension: Option<VehicleExtension>,
}

/// Class-specific vehicle fields.
///
/// Untagged: the variant is recovered from the set of keys present. Each
/// variant owns a key no earlier variant requires, so decoding is unambiguous.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VehicleExtension {
    // ---
    Truck {
        /// kg
        cargo_weight: f64,
        /// km/h
        max_speed: f64,
        /// L/100km
        fuel_consumption: f64,
        trailer_connected: bool,
    },
    Suv {
        passenger_count: u8,
        max_speed: f64,
        fuel_consumption: f64,
        four_wheel_drive: bool,
        /// kg
        roof_rack_load: f64,
    },
    Sedan {
        passenger_count: u8,
        max_speed: f64,
        fuel_consumption: f64,
        air_conditioning: bool,
    },
}
