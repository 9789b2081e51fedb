//! Channel clients, one per destination family.
//!
//! A client owns the transport handle of exactly one destination and turns an
//! encoded payload into a [`DeliveryOutcome`]. Clients never retry and never
//! return errors: transport failures become negative sentinel codes.

pub mod http;
pub mod influxdb;
pub mod lora;

use crate::config::ConfigError;
use crate::destination::Destination;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

pub use http::{JsonClient, ReqwestTransport, ReqwestTransports, XPin};
pub use influxdb::InfluxClient;
pub use lora::{LoraClient, LoraStack, UplinkStatus};

/// Sentinel codes for transport failures, matching the firmware HTTP client.
pub mod codes {
    pub const CONNECTION_REFUSED: i32 = -1;
    pub const SEND_PAYLOAD_FAILED: i32 = -3;
    pub const CONNECTION_LOST: i32 = -5;
    pub const READ_TIMEOUT: i32 = -11;
}

/// Rule deciding whether a result code counts as delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessRule {
    Exact(i32),
    /// Inclusive range
    Range(i32, i32),
}

impl SuccessRule {
    pub fn accepts(self, code: i32) -> bool {
        match self {
            SuccessRule::Exact(expected) => code == expected,
            SuccessRule::Range(low, high) => (low..=high).contains(&code),
        }
    }

    pub fn classify(self, code: i32) -> DeliveryOutcome {
        DeliveryOutcome {
            code,
            success: self.accepts(code),
        }
    }

    /// Success rule the dispatcher applies for each destination.
    pub fn for_destination(destination: Destination) -> Self {
        match destination {
            // Assumed reading of the firmware's malformed custom-server check;
            // to be confirmed with the firmware authors.
            Destination::CustomServer | Destination::Madavi => SuccessRule::Exact(200),
            Destination::SensorCommunity => SuccessRule::Exact(201),
            Destination::Ttn => SuccessRule::Exact(UplinkStatus::UplinkSuccess.code()),
            Destination::InfluxDb => SuccessRule::Range(200, 208),
        }
    }
}

/// Result of one channel call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// HTTP status, negative transport sentinel or uplink status code
    pub code: i32,
    pub success: bool,
}

/// Transport-level failures, before any HTTP status was received.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error("sending request failed: {0}")]
    Send(String),
    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

impl TransportError {
    /// Sentinel result code reported in place of an HTTP status.
    pub fn code(&self) -> i32 {
        match self {
            TransportError::Connect(_) => codes::CONNECTION_REFUSED,
            TransportError::Timeout => codes::READ_TIMEOUT,
            TransportError::Send(_) => codes::SEND_PAYLOAD_FAILED,
            TransportError::ConnectionLost(_) => codes::CONNECTION_LOST,
        }
    }
}

/// Basic-auth credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// An outgoing POST request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
    pub basic_auth: Option<Credentials>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP transport handle owned by a single destination.
///
/// Implementations must have released the connection by the time the future
/// resolves.
pub trait HttpTransport: Send + Sync {
    fn post(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + '_>>;
}

/// Creates the transport handle for each enabled HTTP destination.
pub trait TransportFactory {
    fn transport(&self, destination: Destination) -> Result<Box<dyn HttpTransport>, ConfigError>;
}
