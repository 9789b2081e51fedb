//! LoRaWAN uplink client on top of an external radio/MAC stack.

use super::{DeliveryOutcome, SuccessRule};
use crate::destination::Destination;
use crate::encode::lora::FrameType;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

/// Completion status reported by the LoRaWAN stack for one uplink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum UplinkStatus {
    Unknown = 0,
    EndingError = 1,
    JoinSuccess = 2,
    UplinkSuccess = 3,
    UplinkAcked = 4,
    UplinkAckedWithDownlink = 5,
    UplinkAckedWithDownlinkPending = 6,
}

impl UplinkStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for UplinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// The radio/MAC stack. Join, duty cycle and ADR are its business.
///
/// `poll` drives the stack's internal state machine. It has to be called far
/// more often than measurements are taken, whether or not an uplink is
/// pending, and must return without blocking.
pub trait LoraStack: Send + Sync {
    /// Queue one unconfirmed or confirmed uplink and wait for its completion.
    fn send<'a>(
        &'a self,
        port: u8,
        payload: &'a [u8],
        confirmed: bool,
    ) -> Pin<Box<dyn Future<Output = UplinkStatus> + Send + 'a>>;

    fn poll(&self);
}

/// Sends binary frames through a shared [`LoraStack`].
pub struct LoraClient {
    stack: Arc<dyn LoraStack>,
    rule: SuccessRule,
}

impl LoraClient {
    pub fn new(stack: Arc<dyn LoraStack>) -> Self {
        Self {
            stack,
            rule: SuccessRule::for_destination(Destination::Ttn),
        }
    }

    /// Send one unconfirmed uplink on the frame type's port.
    pub async fn deliver(&self, frame_type: FrameType, payload: &[u8]) -> DeliveryOutcome {
        let status = self.stack.send(frame_type.port(), payload, false).await;
        debug!(destination = %Destination::Ttn, port = frame_type.port(), "uplink status: {status}");
        self.rule.classify(status.code())
    }
}
