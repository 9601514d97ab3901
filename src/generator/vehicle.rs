// src/generator/vehicle.rs

use chrono::Utc;
use rand::Rng;
use std::fmt;
use std::ops::RangeInclusive;

use super::{round_to, sample_location};
use crate::generator::reading::{TirePressure, VehicleExtension, VehicleReading};

pub const ENGINE_TEMPERATURE_C: RangeInclusive<f64> = 80.0..=110.0;
pub const FUEL_LEVEL_PCT: RangeInclusive<f64> = 10.0..=95.0;
pub const MILEAGE_KM: RangeInclusive<u32> = 50_000..=200_000;
pub const TIRE_PRESSURE_PSI: RangeInclusive<f64> = 30.0..=35.0;
pub const BATTERY_VOLTAGE_V: RangeInclusive<f64> = 12.0..=14.4;

pub const TRUCK_CARGO_WEIGHT_KG: RangeInclusive<f64> = 0.0..=20_000.0;
pub const TRUCK_MAX_SPEED_KMH: RangeInclusive<f64> = 80.0..=120.0;
pub const TRUCK_FUEL_CONSUMPTION: RangeInclusive<f64> = 8.0..=15.0;

pub const SEDAN_PASSENGERS: RangeInclusive<u8> = 1..=5;
pub const SEDAN_MAX_SPEED_KMH: RangeInclusive<f64> = 120.0..=180.0;
pub const SEDAN_FUEL_CONSUMPTION: RangeInclusive<f64> = 6.0..=10.0;

pub const SUV_PASSENGERS: RangeInclusive<u8> = 1..=7;
pub const SUV_MAX_SPEED_KMH: RangeInclusive<f64> = 100.0..=160.0;
pub const SUV_FUEL_CONSUMPTION: RangeInclusive<f64> = 8.0..=12.0;
pub const SUV_ROOF_RACK_LOAD_KG: RangeInclusive<f64> = 0.0..=100.0;

/// Vehicle classes with a class-specific extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VehicleKind {
    Truck,
    Sedan,
    Suv,
}

impl VehicleKind {
    /// Every recognized class, in the default topic order.
    pub const ALL: [VehicleKind; 3] = [VehicleKind::Truck, VehicleKind::Sedan, VehicleKind::Suv];

    /// Parse a vehicle type string. Matching is exact and lowercase.
    pub fn parse(vehicle_type: &str) -> Option<Self> {
        match vehicle_type {
            "truck" => Some(VehicleKind::Truck),
            "sedan" => Some(VehicleKind::Sedan),
            "suv" => Some(VehicleKind::Suv),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleKind::Truck => "truck",
            VehicleKind::Sedan => "sedan",
            VehicleKind::Suv => "suv",
        }
    }
}

impl fmt::Display for VehicleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generate one vehicle reading for `vehicle_type`.
///
/// Unrecognized types produce the base fields only; `vehicle_type` still
/// carries the string that was passed in.
pub fn generate_vehicle_reading<R>(rng: &mut R, device_id: &str, vehicle_type: &str) -> VehicleReading
where
    R: Rng + ?Sized,
{
    // ---
    let tire_pressure = TirePressure {
        front_left: round_to(rng.gen_range(TIRE_PRESSURE_PSI), 1),
        front_right: round_to(rng.gen_range(TIRE_PRESSURE_PSI), 1),
        rear_left: round_to(rng.gen_range(TIRE_PRESSURE_PSI), 1),
        rear_right: round_to(rng.gen_range(TIRE_PRESSURE_PSI), 1),
    };

    VehicleReading {
        device_id: device_id.to_string(),
        timestamp: Utc::now(),
        vehicle_type: vehicle_type.to_string(),
        engine_temperature: round_to(rng.gen_range(ENGINE_TEMPERATURE_C), 2),
        fuel_level: round_to(rng.gen_range(FUEL_LEVEL_PCT), 2),
        location: sample_location(rng),
        mileage: rng.gen_range(MILEAGE_KM),
        tire_pressure,
        battery_voltage: round_to(rng.gen_range(BATTERY_VOLTAGE_V), 2),
        extension: VehicleKind::parse(vehicle_type).map(|kind| sample_extension(rng, kind)),
    }
}

fn sample_extension<R>(rng: &mut R, kind: VehicleKind) -> VehicleExtension
where
    R: Rng + ?Sized,
{
    // ---
    match kind {
        VehicleKind::Truck => VehicleExtension::Truck {
            cargo_weight: round_to(rng.gen_range(TRUCK_CARGO_WEIGHT_KG), 2),
            max_speed: round_to(rng.gen_range(TRUCK_MAX_SPEED_KMH), 1),
            fuel_consumption: round_to(rng.gen_range(TRUCK_FUEL_CONSUMPTION), 2),
            trailer_connected: rng.gen_bool(0.5),
        },
        VehicleKind::Sedan => VehicleExtension::Sedan {
            passenger_count: rng.gen_range(SEDAN_PASSENGERS),
            max_speed: round_to(rng.gen_range(SEDAN_MAX_SPEED_KMH), 1),
            fuel_consumption: round_to(rng.gen_range(SEDAN_FUEL_CONSUMPTION), 2),
            air_conditioning: rng.gen_bool(0.5),
        },
        VehicleKind::Suv => VehicleExtension::Suv {
            passenger_count: rng.gen_range(SUV_PASSENGERS),
            max_speed: round_to(rng.gen_range(SUV_MAX_SPEED_KMH), 1),
            fuel_consumption: round_to(rng.gen_range(SUV_FUEL_CONSUMPTION), 2),
            four_wheel_drive: rng.gen_bool(0.5),
            roof_rack_load: round_to(rng.gen_range(SUV_ROOF_RACK_LOAD_KG), 2),
        },
    }
}
