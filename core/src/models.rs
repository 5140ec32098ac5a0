use serde::{Deserialize, Serialize};

/// One telemetry sample from the dive profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct Waypoint {
    /// Elapsed seconds since dive start
    pub dive_time: f64,
    /// Depth in meters
    pub depth: f64,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Source temperature in Kelvin
    pub temperature_raw: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct DiveMetadata {
    /// Dive duration in seconds
    pub dive_duration: f64,
    /// Greatest depth in meters
    pub max_depth: f64,
    /// Average depth in meters
    pub average_depth: f64,
    /// Lowest temperature in Celsius
    pub min_temperature: f64,
    pub dive_number: i64,
    /// ISO-8601 timestamp as written in the log
    pub datetime: String,
    /// Air temperature exactly as written in the log (no unit conversion)
    pub air_temperature: f64,
    /// Surface pressure exactly as written in the log (no unit conversion)
    pub surface_pressure: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct DiverInfo {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct EquipmentInfo {
    pub id: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
}

/// A fully parsed dive log.
///
/// `dive_duration`, `max_depth` and `min_temperature` mirror the matching
/// `metadata` fields so consumers can read the headline numbers directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct ParsedDive {
    pub metadata: DiveMetadata,
    pub diver: DiverInfo,
    pub equipment: EquipmentInfo,
    /// Samples in document order
    pub waypoints: Vec<Waypoint>,
    pub dive_duration: f64,
    pub max_depth: f64,
    pub min_temperature: f64,
}

impl ParsedDive {
    pub fn new(
        metadata: DiveMetadata,
        diver: DiverInfo,
        equipment: EquipmentInfo,
        waypoints: Vec<Waypoint>,
    ) -> Self {
        Self {
            dive_duration: metadata.dive_duration,
            max_depth: metadata.max_depth,
            min_temperature: metadata.min_temperature,
            metadata,
            diver,
            equipment,
            waypoints,
        }
    }

    /// Serialize to the JSON shape handed to the presentation layer.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
