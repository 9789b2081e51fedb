//! Transmission dispatcher: one measurement cycle across all destinations.
//!
//! Destinations are attempted strictly one after another in
//! [`Destination::ALL`] order. Each attempt is independent: a failed or
//! skipped destination never changes what happens to the next one, and no
//! failure escapes [`Dispatcher::transmit`]. The only lasting effect of a
//! cycle is the status record of each attempted destination.

use crate::channel::{
    DeliveryOutcome, InfluxClient, JsonClient, LoraClient, LoraStack, TransportFactory, XPin,
};
use crate::config::{ConfigError, TransmissionConfig};
use crate::destination::Destination;
use crate::encode::influxdb::influx_line;
use crate::encode::json::{JsonVariant, environment_payload, geiger_payload};
use crate::encode::lora::{EnvironmentFrame, FrameType, GeigerFrame};
use crate::poller::RadioPoller;
use crate::snapshot::MeasurementSnapshot;
use crate::status::{StatusDisplay, StatusTracker};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, trace, warn};

/// A JSON client together with the naming scheme its backend expects.
struct JsonRoute {
    client: JsonClient,
    variant: JsonVariant,
}

enum Route<'a> {
    Json(&'a JsonRoute),
    Lora(&'a LoraClient),
    Influx(&'a InfluxClient),
}

/// Outcome of one destination within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub destination: Destination,
    /// Geiger payload (or the combined Influx line)
    pub primary: DeliveryOutcome,
    /// Environment payload, `None` when not sent
    pub secondary: Option<DeliveryOutcome>,
    pub success: bool,
}

impl Attempt {
    fn new(
        destination: Destination,
        primary: DeliveryOutcome,
        secondary: Option<DeliveryOutcome>,
    ) -> Self {
        // A missing secondary payload counts as delivered.
        let success = primary.success && secondary.is_none_or(|outcome| outcome.success);
        Self {
            destination,
            primary,
            secondary,
            success,
        }
    }

    pub fn codes(&self) -> [Option<i32>; 2] {
        [Some(self.primary.code), self.secondary.map(|outcome| outcome.code)]
    }
}

/// Everything attempted during one cycle, in dispatch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub attempts: Vec<Attempt>,
}

impl CycleReport {
    pub fn attempt(&self, destination: Destination) -> Option<&Attempt> {
        self.attempts.iter().find(|a| a.destination == destination)
    }

    pub fn all_succeeded(&self) -> bool {
        self.attempts.iter().all(|a| a.success)
    }
}

/// Drives deliveries to every enabled destination.
///
/// Only enabled destinations get a channel handle; the handles live as long as
/// the dispatcher and are reused every cycle.
pub struct Dispatcher {
    custom_server: Option<JsonRoute>,
    madavi: Option<JsonRoute>,
    sensor_community: Option<JsonRoute>,
    ttn: Option<LoraClient>,
    influx: Option<InfluxClient>,
    lora_credentials: bool,
    software_version: String,
    lora_version: u16,
    http_spacing: Duration,
    status: Arc<StatusTracker>,
    display: Arc<dyn StatusDisplay>,
    poller: RadioPoller,
}

impl Dispatcher {
    /// Create channel handles for the enabled destinations.
    ///
    /// `lora` is the radio stack when LoRa hardware is present; without it the
    /// TTN destination stays off even if enabled.
    pub fn new(
        config: &TransmissionConfig,
        transports: &dyn TransportFactory,
        lora: Option<Arc<dyn LoraStack>>,
        display: Arc<dyn StatusDisplay>,
    ) -> Result<Self, ConfigError> {
        let json_route = |destination: Destination| -> Result<Option<JsonRoute>, ConfigError> {
            let settings = config.destination(destination);
            if !settings.enabled {
                return Ok(None);
            }
            let transport = transports.transport(destination)?;
            Ok(Some(JsonRoute {
                client: JsonClient::new(settings, config, transport),
                variant: JsonVariant::for_family(settings.family).unwrap_or(JsonVariant::Generic),
            }))
        };

        let custom_server = json_route(Destination::CustomServer)?;
        let madavi = json_route(Destination::Madavi)?;
        let sensor_community = json_route(Destination::SensorCommunity)?;

        let influx = if config.influx.destination.enabled {
            let transport = transports.transport(Destination::InfluxDb)?;
            Some(InfluxClient::new(&config.influx, config, transport))
        } else {
            None
        };

        let lora = match (config.ttn.enabled, lora) {
            (true, Some(stack)) => Some(stack),
            (true, None) => {
                warn!("{} enabled without LoRa hardware, leaving it off", Destination::Ttn);
                None
            }
            (false, _) => None,
        };
        let ttn = lora.clone().map(LoraClient::new);
        let poller = RadioPoller::new(lora);

        let enabled = [
            custom_server.is_some(),
            madavi.is_some(),
            sensor_community.is_some(),
            ttn.is_some(),
            influx.is_some(),
        ];
        let status = Arc::new(StatusTracker::new(|d| enabled[d.index()]));

        Ok(Self {
            custom_server,
            madavi,
            sensor_community,
            ttn,
            influx,
            lora_credentials: config.lora.is_present(),
            software_version: config.firmware_version.as_str().to_string(),
            lora_version: config.firmware_version.lora_code(),
            http_spacing: config.http_spacing,
            status,
            display,
            poller,
        })
    }

    /// Shared status records, for the display collaborator.
    pub fn status(&self) -> Arc<StatusTracker> {
        self.status.clone()
    }

    /// Poll hook for the LoRa stack, to be ticked by the host scheduler.
    pub fn poller(&self) -> RadioPoller {
        self.poller.clone()
    }

    fn route(&self, destination: Destination) -> Option<Route<'_>> {
        match destination {
            Destination::CustomServer => self.custom_server.as_ref().map(Route::Json),
            Destination::Madavi => self.madavi.as_ref().map(Route::Json),
            Destination::SensorCommunity => self.sensor_community.as_ref().map(Route::Json),
            Destination::Ttn => self.ttn.as_ref().map(Route::Lora),
            Destination::InfluxDb => self.influx.as_ref().map(Route::Influx),
        }
    }

    fn precondition_met(&self, route: &Route<'_>, snapshot: &MeasurementSnapshot) -> bool {
        match route {
            Route::Json(_) | Route::Influx(_) => snapshot.wifi.is_connected(),
            Route::Lora(_) => self.lora_credentials,
        }
    }

    /// Run one measurement cycle.
    ///
    /// Destinations that are disabled or whose precondition fails (no Wi-Fi
    /// for HTTP backends, no LoRa credentials for TTN) are skipped and keep
    /// their status.
    pub async fn transmit(&self, snapshot: &MeasurementSnapshot) -> CycleReport {
        let mut report = CycleReport::default();

        for destination in Destination::ALL {
            let Some(route) = self.route(destination) else {
                continue;
            };
            if !self.precondition_met(&route, snapshot) {
                trace!(%destination, "precondition not met, skipping");
                continue;
            }

            info!("Sending to {destination} ...");
            self.status.begin_sending(destination);
            self.display.refresh(&self.status);

            let (primary, secondary) = self.deliver(destination, &route, snapshot).await;
            let attempt = Attempt::new(destination, primary, secondary);

            match secondary {
                Some(secondary) => info!(
                    "Sent to {destination}, status: {}, http: {}, {}",
                    verdict(attempt.success),
                    primary.code,
                    secondary.code
                ),
                None => info!(
                    "Sent to {destination}, status: {}, http: {}",
                    verdict(attempt.success),
                    primary.code
                ),
            }

            self.status.finish(destination, attempt.success, attempt.codes());
            self.display.refresh(&self.status);

            if destination.is_spaced() && !self.http_spacing.is_zero() {
                tokio::time::sleep(self.http_spacing).await;
            }

            report.attempts.push(attempt);
        }

        report
    }

    async fn deliver(
        &self,
        destination: Destination,
        route: &Route<'_>,
        snapshot: &MeasurementSnapshot,
    ) -> (DeliveryOutcome, Option<DeliveryOutcome>) {
        match route {
            Route::Json(route) => {
                let (geiger_pin, environment_pin) = xpins(destination);
                let body = geiger_payload(snapshot, &self.software_version, route.variant);
                let primary = route.client.deliver(body.to_string(), geiger_pin).await;

                let secondary = match &snapshot.environment {
                    Some(environment) => {
                        let body =
                            environment_payload(environment, &self.software_version, route.variant);
                        Some(route.client.deliver(body.to_string(), environment_pin).await)
                    }
                    None => None,
                };
                (primary, secondary)
            }
            Route::Lora(client) => {
                let frame = GeigerFrame::new(snapshot, self.lora_version).encode();
                let primary = client.deliver(FrameType::Geiger, &frame).await;

                let secondary = match &snapshot.environment {
                    Some(environment) => {
                        let frame = EnvironmentFrame::new(environment).encode();
                        Some(client.deliver(FrameType::Environment, &frame).await)
                    }
                    None => None,
                };
                (primary, secondary)
            }
            Route::Influx(client) => {
                let line = influx_line(snapshot, client.measurement());
                (client.deliver(line).await, None)
            }
        }
    }
}

/// `X-PIN` headers for the geiger and environment payloads.
fn xpins(destination: Destination) -> (Option<XPin>, Option<XPin>) {
    match destination {
        Destination::SensorCommunity => (Some(XPin::RADIATION), Some(XPin::BME280)),
        _ => (None, None),
    }
}

fn verdict(success: bool) -> &'static str {
    if success { "ok" } else { "error" }
}
