//! The fixed set of telemetry destinations and their static configuration.

use std::fmt;

/// A backend telemetry sink.
///
/// The declaration order is the order the dispatcher attempts them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Destination {
    /// Custom debug server
    CustomServer,
    Madavi,
    /// sensor.community
    SensorCommunity,
    /// The Things Network via LoRaWAN
    Ttn,
    InfluxDb,
}

impl Destination {
    pub const COUNT: usize = 5;

    /// All destinations in dispatch order.
    pub const ALL: [Destination; Destination::COUNT] = [
        Destination::CustomServer,
        Destination::Madavi,
        Destination::SensorCommunity,
        Destination::Ttn,
        Destination::InfluxDb,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// The wire family each destination speaks.
    pub fn family(self) -> ProtocolFamily {
        match self {
            Destination::CustomServer | Destination::SensorCommunity => ProtocolFamily::JsonHttp,
            Destination::Madavi => ProtocolFamily::JsonHttpNamed,
            Destination::Ttn => ProtocolFamily::LoraBinary,
            Destination::InfluxDb => ProtocolFamily::InfluxLineProtocol,
        }
    }

    /// Whether a short pause follows deliveries to this destination.
    pub(crate) fn is_spaced(self) -> bool {
        matches!(self, Destination::Madavi | Destination::SensorCommunity)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Destination::CustomServer => "CUSTOMSRV",
            Destination::Madavi => "Madavi",
            Destination::SensorCommunity => "sensor.community",
            Destination::Ttn => "TTN",
            Destination::InfluxDb => "Influx-DB",
        };
        f.write_str(name)
    }
}

/// Wire protocol family of a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFamily {
    /// Generic `sensordatavalues` JSON over HTTP(S)
    JsonHttp,
    /// Same JSON, with value types prefixed by sensor name
    JsonHttpNamed,
    /// Packed binary LoRaWAN uplink
    LoraBinary,
    /// InfluxDB line protocol over HTTP(S)
    InfluxLineProtocol,
}

impl ProtocolFamily {
    pub fn is_http(self) -> bool {
        !matches!(self, ProtocolFamily::LoraBinary)
    }
}

/// Static per-destination settings, fixed after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationConfig {
    pub destination: Destination,
    pub enabled: bool,
    /// Target URL; unused for LoRa
    pub url: String,
    pub family: ProtocolFamily,
}

impl DestinationConfig {
    pub fn new(destination: Destination, enabled: bool, url: impl Into<String>) -> Self {
        Self {
            destination,
            enabled,
            url: url.into(),
            family: destination.family(),
        }
    }
}
