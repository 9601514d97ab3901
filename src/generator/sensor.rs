// src/generator/sensor.rs

use chrono::Utc;
use rand::Rng;
use std::ops::RangeInclusive;

use super::{round_to, sample_location};
use crate::generator::reading::SensorReading;

pub const TEMPERATURE_C: RangeInclusive<f64> = 20.0..=35.0;
pub const HUMIDITY_PCT: RangeInclusive<f64> = 40.0..=80.0;
pub const PRESSURE_HPA: RangeInclusive<f64> = 990.0..=1020.0;
pub const BATTERY_LEVEL_PCT: RangeInclusive<u8> = 10..=100;
pub const SIGNAL_STRENGTH_DBM: RangeInclusive<i16> = -90..=-30;

/// Generate one sensor reading, every field sampled independently.
pub fn generate_sensor_reading<R>(rng: &mut R, device_id: &str) -> SensorReading
where
    R: Rng + ?Sized,
{
    // ---
    SensorReading {
        device_id: device_id.to_string(),
        timestamp: Utc::now(),
        temperature: round_to(rng.gen_range(TEMPERATURE_C), 2),
        humidity: round_to(rng.gen_range(HUMIDITY_PCT), 2),
        pressure: round_to(rng.gen_range(PRESSURE_HPA), 2),
        location: sample_location(rng),
        battery_level: rng.gen_range(BATTERY_LEVEL_PCT),
        signal_strength: rng.gen_range(SIGNAL_STRENGTH_DBM),
        message: None,
    }
}
