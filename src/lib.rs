//! `multigeiger-transmission` library.
//!
//! Fans one measurement snapshot per cycle out to the enabled telemetry
//! destinations (custom server, Madavi, sensor.community, TTN, InfluxDB),
//! tracking a status per destination for the device display.
//!
//! The binary (`src/main.rs`) is responsible for logging setup and process exit
//! codes. The per-cycle logic lives in [`crate::dispatcher`], the run loop in
//! [`crate::app`], both testable with injected transports and sources.

pub mod app;
pub mod channel;
pub mod config;
pub mod destination;
pub mod dispatcher;
pub mod duration;
pub mod encode;
pub mod poller;
pub mod snapshot;
pub mod status;
pub mod version;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types at the crate root
pub use channel::{
    DeliveryOutcome, HttpTransport, LoraStack, ReqwestTransports, SuccessRule, TransportError,
    TransportFactory, UplinkStatus,
};
pub use config::{ConfigError, TransmissionConfig};
pub use destination::{Destination, DestinationConfig, ProtocolFamily};
pub use dispatcher::{Attempt, CycleReport, Dispatcher};
pub use poller::RadioPoller;
pub use snapshot::{Environment, MeasurementSnapshot, WifiStatus};
pub use status::{ChannelState, DestinationStatus, LogDisplay, StatusDisplay, StatusTracker};
pub use version::{FirmwareVersion, ParseVersionError};
