//! Payload encoders for each destination family.
//!
//! Every encoder is a pure function of the snapshot (plus static settings such
//! as the firmware version) and owns its output buffer. The backends parse
//! these formats strictly, so field names, ordering and number formatting are
//! part of the contract.

pub mod influxdb;
pub mod json;
pub mod lora;

pub use influxdb::{DataPoint, FieldValue, influx_line};
pub use json::{JsonVariant, SensorDataValue, SensorPayload, environment_payload, geiger_payload};
pub use lora::{EnvironmentFrame, FrameType, GeigerFrame};
