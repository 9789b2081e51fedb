//! Measurement snapshot handed to the dispatcher once per cycle.

use serde::Deserialize;

/// Wi-Fi connectivity as reported by the network collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WifiStatus {
    #[default]
    Off,
    Connecting,
    Connected,
    Error,
    AccessPoint,
}

impl WifiStatus {
    /// HTTP-family destinations are only attempted while connected.
    pub fn is_connected(self) -> bool {
        self == WifiStatus::Connected
    }
}

/// Environmental readings from the THP sensor.
///
/// - Temperature in Celsius
/// - Relative humidity in percent (0-100)
/// - Pressure in Pascals
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Environment {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

/// One cycle's worth of measured values.
///
/// Built by the acquisition side, read-only for the rest of the cycle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeasurementSnapshot {
    /// Tube type name, e.g. "Radiation SBM-20"
    pub tube_type: String,
    /// Tube index sent in the LoRa frame
    pub tube_index: u8,
    /// Sample interval in milliseconds
    pub interval_ms: u32,
    /// High-voltage generator pulses during the interval
    pub hv_pulses: u32,
    /// Raw Geiger-Mueller counts during the interval
    pub counts: u32,
    /// Counts per minute
    pub cpm: u32,
    /// Dose rate in uSv/h
    pub dose_rate: f64,
    /// Temperature/humidity/pressure, absent without a THP sensor
    #[serde(default)]
    pub environment: Option<Environment>,
    #[serde(default)]
    pub wifi: WifiStatus,
}

impl MeasurementSnapshot {
    pub fn has_environment(&self) -> bool {
        self.environment.is_some()
    }
}
