//! Immutable transmission configuration, built once at startup.

use crate::destination::{Destination, DestinationConfig};
use crate::version::FirmwareVersion;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const MADAVI_URL: &str = "http://api-rrd.madavi.de/data.php";
pub const SENSOR_COMMUNITY_URL: &str = "http://api.sensor.community/v1/push-sensor-data/";
pub const CUSTOM_SERVER_URL: &str = "https://ptsv2.com/t/xxxxx-yyyyyyyyyy/post";

/// Default pause after Madavi and sensor.community deliveries.
pub const DEFAULT_HTTP_SPACING: Duration = Duration::from_millis(300);

/// Errors raised while setting up channel handles.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read CA bundle {path}: {source}")]
    CaBundle {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid CA certificate: {0}")]
    Certificate(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// InfluxDB specific settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfluxConfig {
    pub destination: DestinationConfig,
    /// Measurement name of the written line
    pub measurement: String,
    pub user: String,
    pub password: String,
}

/// LoRaWAN network credentials.
///
/// The dispatcher only checks [`LoraCredentials::is_present`]. DevEUI and
/// AppKey are carried for the host that joins its [`LoraStack`] to the
/// network.
///
/// [`LoraStack`]: crate::channel::LoraStack
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoraCredentials {
    pub app_eui: String,
    pub dev_eui: String,
    pub app_key: String,
}

impl LoraCredentials {
    /// Uplinks are only attempted once an AppEUI is configured.
    pub fn is_present(&self) -> bool {
        !self.app_eui.is_empty()
    }
}

/// Everything the dispatcher and channel clients need to know.
#[derive(Debug, Clone)]
pub struct TransmissionConfig {
    pub firmware_version: FirmwareVersion,
    /// Device identity sent as `X-Sensor`
    pub device_id: String,
    /// Log request and response bodies
    pub debug_server_send: bool,
    /// Pause after deliveries to rate-sensitive backends
    pub http_spacing: Duration,
    /// Extra PEM root certificates for HTTPS
    pub ca_bundle: Option<PathBuf>,
    pub custom_server: DestinationConfig,
    pub madavi: DestinationConfig,
    pub sensor_community: DestinationConfig,
    pub ttn: DestinationConfig,
    pub lora: LoraCredentials,
    pub influx: InfluxConfig,
}

impl TransmissionConfig {
    /// Defaults with every destination disabled.
    pub fn new(firmware_version: FirmwareVersion, device_id: impl Into<String>) -> Self {
        Self {
            firmware_version,
            device_id: device_id.into(),
            debug_server_send: false,
            http_spacing: DEFAULT_HTTP_SPACING,
            ca_bundle: None,
            custom_server: DestinationConfig::new(Destination::CustomServer, false, CUSTOM_SERVER_URL),
            madavi: DestinationConfig::new(Destination::Madavi, false, MADAVI_URL),
            sensor_community: DestinationConfig::new(
                Destination::SensorCommunity,
                false,
                SENSOR_COMMUNITY_URL,
            ),
            ttn: DestinationConfig::new(Destination::Ttn, false, ""),
            lora: LoraCredentials::default(),
            influx: InfluxConfig {
                destination: DestinationConfig::new(Destination::InfluxDb, false, ""),
                measurement: "geiger".to_string(),
                user: String::new(),
                password: String::new(),
            },
        }
    }

    pub fn destination(&self, destination: Destination) -> &DestinationConfig {
        match destination {
            Destination::CustomServer => &self.custom_server,
            Destination::Madavi => &self.madavi,
            Destination::SensorCommunity => &self.sensor_community,
            Destination::Ttn => &self.ttn,
            Destination::InfluxDb => &self.influx.destination,
        }
    }

    pub fn is_enabled(&self, destination: Destination) -> bool {
        self.destination(destination).enabled
    }
}

/// Device identity from the access point SSID ("ESP32-123" -> "esp32-123").
pub fn device_id_from_ssid(ssid: &str) -> String {
    ssid.replace("ESP32", "esp32")
}
