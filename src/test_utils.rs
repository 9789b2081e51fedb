use crate::channel::{
    HttpRequest, HttpResponse, HttpTransport, LoraStack, TransportError, TransportFactory,
    UplinkStatus,
};
use crate::config::{ConfigError, TransmissionConfig};
use crate::destination::Destination;
use crate::snapshot::{Environment, MeasurementSnapshot, WifiStatus};
use crate::status::{ChannelState, DestinationStatus, StatusDisplay, StatusTracker};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A snapshot without environment data, connected to Wi-Fi.
///
/// Tests can override just the fields they care about.
pub fn base_snapshot() -> MeasurementSnapshot {
    MeasurementSnapshot {
        tube_type: "Radiation SBM-20".to_string(),
        tube_index: 1,
        interval_ms: 60_000,
        hv_pulses: 7,
        counts: 43,
        cpm: 42,
        dose_rate: 0.2394,
        environment: None,
        wifi: WifiStatus::Connected,
    }
}

pub fn test_environment() -> Environment {
    Environment {
        temperature: 21.5,
        humidity: 45.25,
        pressure: 101_325.0,
    }
}

/// All destinations disabled, LoRa credentials present, no HTTP spacing.
pub fn test_config() -> TransmissionConfig {
    let mut config = TransmissionConfig::new(
        "V1.17.3".parse().expect("valid version"),
        "esp32-51564452",
    );
    config.http_spacing = Duration::ZERO;
    config.lora.app_eui = "70B3D57ED0000000".to_string();
    config.influx.destination.url = "http://influx.local:8086/write?db=geiger".to_string();
    config
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeResponse {
    Status(u16),
    Refused,
}

type SharedTracker = Arc<Mutex<Option<Arc<StatusTracker>>>>;

/// Transport answering from a script and recording every request.
///
/// The last scripted response repeats once the script runs out.
#[derive(Clone)]
pub struct FakeTransport {
    destination: Option<Destination>,
    script: Arc<Mutex<VecDeque<FakeResponse>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    observed: Arc<Mutex<Vec<ChannelState>>>,
    tracker: SharedTracker,
}

impl FakeTransport {
    pub fn new(response: FakeResponse) -> Self {
        Self::scripted(None, vec![response], SharedTracker::default())
    }

    fn scripted(
        destination: Option<Destination>,
        script: Vec<FakeResponse>,
        tracker: SharedTracker,
    ) -> Self {
        Self {
            destination,
            script: Arc::new(Mutex::new(script.into())),
            requests: Arc::default(),
            observed: Arc::default(),
            tracker,
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> FakeResponse {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().copied().unwrap_or(FakeResponse::Refused)
        }
    }
}

impl HttpTransport for FakeTransport {
    fn post(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + '_>> {
        if let Some(destination) = self.destination {
            let tracker = self.tracker.lock().unwrap();
            if let Some(tracker) = tracker.as_ref() {
                self.observed.lock().unwrap().push(tracker.state(destination));
            }
        }
        self.requests.lock().unwrap().push(request);

        let response = self.next_response();
        Box::pin(async move {
            match response {
                FakeResponse::Status(status) => Ok(HttpResponse {
                    status,
                    body: "ok".to_string(),
                }),
                FakeResponse::Refused => {
                    Err(TransportError::Connect("connection refused".to_string()))
                }
            }
        })
    }
}

/// Factory handing out [`FakeTransport`]s with per-destination scripts.
pub struct FakeTransports {
    fallback: FakeResponse,
    scripts: HashMap<Destination, Vec<FakeResponse>>,
    created: Mutex<Vec<(Destination, FakeTransport)>>,
    tracker: SharedTracker,
}

impl FakeTransports {
    pub fn new(fallback: FakeResponse) -> Self {
        Self {
            fallback,
            scripts: HashMap::new(),
            created: Mutex::new(Vec::new()),
            tracker: SharedTracker::default(),
        }
    }

    pub fn with(self, destination: Destination, response: FakeResponse) -> Self {
        self.with_sequence(destination, vec![response])
    }

    pub fn with_sequence(mut self, destination: Destination, script: Vec<FakeResponse>) -> Self {
        self.scripts.insert(destination, script);
        self
    }

    /// Record the destination's state whenever one of its requests is issued.
    pub fn observe(&self, tracker: Arc<StatusTracker>) {
        *self.tracker.lock().unwrap() = Some(tracker);
    }

    /// Destinations a transport was created for, in creation order.
    pub fn created(&self) -> Vec<Destination> {
        self.created.lock().unwrap().iter().map(|(d, _)| *d).collect()
    }

    fn find(&self, destination: Destination) -> Option<FakeTransport> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .find(|(d, _)| *d == destination)
            .map(|(_, transport)| transport.clone())
    }

    pub fn requests(&self, destination: Destination) -> Vec<HttpRequest> {
        self.find(destination)
            .map(|transport| transport.requests())
            .unwrap_or_default()
    }

    pub fn states_during_requests(&self, destination: Destination) -> Vec<ChannelState> {
        self.find(destination)
            .map(|transport| transport.observed.lock().unwrap().clone())
            .unwrap_or_default()
    }
}

impl TransportFactory for FakeTransports {
    fn transport(&self, destination: Destination) -> Result<Box<dyn HttpTransport>, ConfigError> {
        let script = self
            .scripts
            .get(&destination)
            .cloned()
            .unwrap_or_else(|| vec![self.fallback]);
        let transport = FakeTransport::scripted(Some(destination), script, self.tracker.clone());
        self.created
            .lock()
            .unwrap()
            .push((destination, transport.clone()));
        Ok(Box::new(transport))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uplink {
    pub port: u8,
    pub payload: Vec<u8>,
    pub confirmed: bool,
}

/// LoRa stack completing every uplink with a fixed status.
pub struct FakeLoraStack {
    status: UplinkStatus,
    uplinks: Mutex<Vec<Uplink>>,
    polls: AtomicUsize,
}

impl FakeLoraStack {
    pub fn new(status: UplinkStatus) -> Self {
        Self {
            status,
            uplinks: Mutex::new(Vec::new()),
            polls: AtomicUsize::new(0),
        }
    }

    pub fn uplinks(&self) -> Vec<Uplink> {
        self.uplinks.lock().unwrap().clone()
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

impl LoraStack for FakeLoraStack {
    fn send<'a>(
        &'a self,
        port: u8,
        payload: &'a [u8],
        confirmed: bool,
    ) -> Pin<Box<dyn Future<Output = UplinkStatus> + Send + 'a>> {
        self.uplinks.lock().unwrap().push(Uplink {
            port,
            payload: payload.to_vec(),
            confirmed,
        });
        let status = self.status;
        Box::pin(async move { status })
    }

    fn poll(&self) {
        self.polls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Display remembering every status it was refreshed with.
#[derive(Default)]
pub struct RecordingDisplay {
    refreshes: Mutex<Vec<[(Destination, DestinationStatus); Destination::COUNT]>>,
}

impl RecordingDisplay {
    /// States of one destination across all refreshes, skipping repeats.
    pub fn states(&self, destination: Destination) -> Vec<ChannelState> {
        let mut states: Vec<ChannelState> = Vec::new();
        for refresh in self.refreshes.lock().unwrap().iter() {
            let state = refresh[destination.index()].1.state;
            if states.last() != Some(&state) {
                states.push(state);
            }
        }
        states
    }
}

impl StatusDisplay for RecordingDisplay {
    fn refresh(&self, status: &StatusTracker) {
        self.refreshes.lock().unwrap().push(status.all());
    }
}
