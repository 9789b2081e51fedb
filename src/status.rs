//! Per-destination transmission status for the display.
//!
//! Each destination owns one `watch` slot. A write replaces the whole record,
//! so readers never see a state from one attempt paired with codes from
//! another.

use crate::destination::Destination;
use std::fmt;
use tokio::sync::watch;

/// Operational state of one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Disabled for the lifetime of the process
    Off,
    /// Enabled, not attempted yet
    Init,
    /// Last attempt succeeded
    Idle,
    /// Attempt in flight
    Sending,
    /// Last attempt failed
    Error,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelState::Off => "off",
            ChannelState::Init => "init",
            ChannelState::Idle => "idle",
            ChannelState::Sending => "sending",
            ChannelState::Error => "error",
        };
        f.write_str(name)
    }
}

/// State plus the result codes of the last attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestinationStatus {
    pub state: ChannelState,
    /// Primary and secondary result codes; the secondary is `None` when no
    /// second call was made.
    pub last_codes: [Option<i32>; 2],
}

impl DestinationStatus {
    fn initial(enabled: bool) -> Self {
        Self {
            state: if enabled {
                ChannelState::Init
            } else {
                ChannelState::Off
            },
            last_codes: [None, None],
        }
    }
}

/// Status records of all destinations.
#[derive(Debug)]
pub struct StatusTracker {
    slots: [watch::Sender<DestinationStatus>; Destination::COUNT],
}

impl StatusTracker {
    /// Enablement is decided once here: `Init` when enabled, `Off` forever otherwise.
    pub fn new(enabled: impl Fn(Destination) -> bool) -> Self {
        let slots = Destination::ALL
            .map(|destination| watch::channel(DestinationStatus::initial(enabled(destination))).0);
        Self { slots }
    }

    pub fn get(&self, destination: Destination) -> DestinationStatus {
        *self.slots[destination.index()].borrow()
    }

    pub fn state(&self, destination: Destination) -> ChannelState {
        self.get(destination).state
    }

    /// Receiver notified on every change of one destination's status.
    pub fn subscribe(&self, destination: Destination) -> watch::Receiver<DestinationStatus> {
        self.slots[destination.index()].subscribe()
    }

    /// Current status of every destination in dispatch order.
    pub fn all(&self) -> [(Destination, DestinationStatus); Destination::COUNT] {
        Destination::ALL.map(|destination| (destination, self.get(destination)))
    }

    /// `Init | Idle | Error -> Sending`. Returns false for any other state.
    pub(crate) fn begin_sending(&self, destination: Destination) -> bool {
        self.slots[destination.index()].send_if_modified(|status| match status.state {
            ChannelState::Init | ChannelState::Idle | ChannelState::Error => {
                status.state = ChannelState::Sending;
                true
            }
            ChannelState::Off | ChannelState::Sending => false,
        })
    }

    /// `Sending -> Idle | Error`, recording the result codes.
    pub(crate) fn finish(&self, destination: Destination, success: bool, codes: [Option<i32>; 2]) -> bool {
        self.slots[destination.index()].send_if_modified(|status| {
            if status.state != ChannelState::Sending {
                return false;
            }
            *status = DestinationStatus {
                state: if success {
                    ChannelState::Idle
                } else {
                    ChannelState::Error
                },
                last_codes: codes,
            };
            true
        })
    }
}

impl fmt::Display for StatusTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (destination, status) in self.all() {
            if first {
                first = false;
            } else {
                write!(f, " ")?;
            }
            write!(f, "{destination}={}", status.state)?;
        }
        Ok(())
    }
}

/// Display collaborator refreshed after every status change.
pub trait StatusDisplay: Send + Sync {
    fn refresh(&self, status: &StatusTracker);
}

/// Display that writes the status line to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDisplay;

impl StatusDisplay for LogDisplay {
    fn refresh(&self, status: &StatusTracker) {
        tracing::debug!(target: "multigeiger_transmission::display", "{status}");
    }
}
