//! `sensordatavalues` JSON bodies for Madavi, sensor.community and custom servers.

use crate::destination::ProtocolFamily;
use crate::snapshot::{Environment, MeasurementSnapshot};
use serde::Serialize;
use std::fmt;

/// Number of leading characters stripped from the tube type to get the
/// sensor name ("Radiation SBM-20" -> "SBM-20").
const TUBE_NAME_OFFSET: usize = 10;

/// Sensor name prefix for environment values in the named variant.
const ENVIRONMENT_SENSOR: &str = "BME280";

/// Naming scheme for `value_type` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonVariant {
    /// Plain names, e.g. `counts_per_minute`
    Generic,
    /// Names prefixed by the sensor, e.g. `SBM-20_counts_per_minute`
    NamedByTube,
}

impl JsonVariant {
    /// Variant for a JSON family, `None` for non-JSON families.
    pub fn for_family(family: ProtocolFamily) -> Option<Self> {
        match family {
            ProtocolFamily::JsonHttp => Some(JsonVariant::Generic),
            ProtocolFamily::JsonHttpNamed => Some(JsonVariant::NamedByTube),
            ProtocolFamily::LoraBinary | ProtocolFamily::InfluxLineProtocol => None,
        }
    }
}

/// One `{"value_type": ..., "value": ...}` pair. Values are always strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorDataValue {
    pub value_type: String,
    pub value: String,
}

/// A complete JSON request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorPayload {
    pub software_version: String,
    pub sensordatavalues: Vec<SensorDataValue>,
}

impl SensorPayload {
    fn new(software_version: &str) -> Self {
        Self {
            software_version: software_version.to_string(),
            sensordatavalues: Vec::new(),
        }
    }

    fn push(&mut self, prefix: Option<&str>, value_type: &str, value: String) {
        let value_type = match prefix {
            Some(prefix) => format!("{prefix}_{value_type}"),
            None => value_type.to_string(),
        };
        self.sensordatavalues.push(SensorDataValue { value_type, value });
    }
}

impl fmt::Display for SensorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Sensor name derived from the tube type by a fixed-offset strip.
///
/// Shorter tube types yield an empty name.
pub fn tube_name(tube_type: &str) -> &str {
    tube_type
        .char_indices()
        .nth(TUBE_NAME_OFFSET)
        .map_or("", |(idx, _)| &tube_type[idx..])
}

/// Geiger counter values: cpm, HV pulses, raw counts and the sample time.
pub fn geiger_payload(
    snapshot: &MeasurementSnapshot,
    software_version: &str,
    variant: JsonVariant,
) -> SensorPayload {
    let prefix = match variant {
        JsonVariant::Generic => None,
        JsonVariant::NamedByTube => Some(tube_name(&snapshot.tube_type)),
    };

    let mut payload = SensorPayload::new(software_version);
    payload.push(prefix, "counts_per_minute", snapshot.cpm.to_string());
    payload.push(prefix, "hv_pulses", snapshot.hv_pulses.to_string());
    payload.push(prefix, "counts", snapshot.counts.to_string());
    payload.push(prefix, "sample_time_ms", snapshot.interval_ms.to_string());
    payload
}

/// Temperature, humidity and pressure with two decimals each.
pub fn environment_payload(
    environment: &Environment,
    software_version: &str,
    variant: JsonVariant,
) -> SensorPayload {
    let prefix = match variant {
        JsonVariant::Generic => None,
        JsonVariant::NamedByTube => Some(ENVIRONMENT_SENSOR),
    };

    let mut payload = SensorPayload::new(software_version);
    payload.push(prefix, "temperature", format!("{:.2}", environment.temperature));
    payload.push(prefix, "humidity", format!("{:.2}", environment.humidity));
    payload.push(prefix, "pressure", format!("{:.2}", environment.pressure));
    payload
}
