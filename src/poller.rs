//! Cooperative polling of the LoRaWAN stack.
//!
//! The stack keeps its own timers for retransmission and duty cycle, and only
//! makes progress when polled. The host is responsible for calling
//! [`RadioPoller::tick`] at least every [`MIN_POLL_INTERVAL`], independent of
//! the measurement cycle, or for spawning [`RadioPoller::run`].

use crate::channel::LoraStack;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound for the gap between two ticks.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Handle for polling the LoRa stack of the TTN destination.
///
/// Cheap to clone. Without a LoRa destination every tick is a no-op.
#[derive(Clone, Default)]
pub struct RadioPoller {
    stack: Option<Arc<dyn LoraStack>>,
}

impl RadioPoller {
    pub(crate) fn new(stack: Option<Arc<dyn LoraStack>>) -> Self {
        Self { stack }
    }

    /// Whether there is a stack to poll at all.
    pub fn is_active(&self) -> bool {
        self.stack.is_some()
    }

    /// Let the stack advance its state machine. Never blocks.
    pub fn tick(&self) {
        if let Some(stack) = &self.stack {
            stack.poll();
        }
    }

    /// Tick forever on a fixed period. Missed ticks are skipped, not bunched.
    pub async fn run(self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            self.tick();
        }
    }
}

impl std::fmt::Debug for RadioPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadioPoller")
            .field("active", &self.is_active())
            .finish()
    }
}
