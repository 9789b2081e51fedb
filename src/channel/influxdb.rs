//! InfluxDB line protocol client.

use super::{Credentials, DeliveryOutcome, HttpRequest, HttpTransport, SuccessRule};
use crate::config::{InfluxConfig, TransmissionConfig};
use crate::destination::Destination;
use tracing::{debug, error};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Header naming the target measurement.
pub const MEASUREMENT_HEADER: &str = "X-Influx-Measurement";

/// Client posting line protocol bodies to an InfluxDB write endpoint.
pub struct InfluxClient {
    url: String,
    device_id: String,
    measurement: String,
    credentials: Option<Credentials>,
    debug: bool,
    rule: SuccessRule,
    transport: Box<dyn HttpTransport>,
}

impl InfluxClient {
    pub fn new(
        influx: &InfluxConfig,
        config: &TransmissionConfig,
        transport: Box<dyn HttpTransport>,
    ) -> Self {
        // Credentials are only sent when at least one of them is set.
        let credentials = (!influx.user.is_empty() || !influx.password.is_empty()).then(|| {
            Credentials {
                user: influx.user.clone(),
                password: influx.password.clone(),
            }
        });

        Self {
            url: influx.destination.url.clone(),
            device_id: config.device_id.clone(),
            measurement: influx.measurement.clone(),
            credentials,
            debug: config.debug_server_send,
            rule: SuccessRule::for_destination(Destination::InfluxDb),
            transport,
        }
    }

    /// Measurement name written at the start of every line.
    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    /// POST one line protocol body.
    pub async fn deliver(&self, body: String) -> DeliveryOutcome {
        let destination = Destination::InfluxDb;
        if self.debug {
            debug!(%destination, "http request body: {body}");
        }

        let request = HttpRequest {
            url: self.url.clone(),
            headers: vec![
                ("Content-Type", FORM_CONTENT_TYPE.to_string()),
                ("X-Sensor", self.device_id.clone()),
                (MEASUREMENT_HEADER, self.measurement.clone()),
            ],
            body,
            basic_auth: self.credentials.clone(),
        };

        let code = match self.transport.post(request).await {
            Ok(response) => {
                let code = i32::from(response.status);
                if self.rule.accepts(code) {
                    debug!(%destination, "Sent to influx-db, status: ok, http: {code}");
                } else if code >= 400 {
                    debug!(%destination, "Sent to influx-db, status: error, http: {code}");
                    debug!(%destination, "Details: {}", response.body);
                }
                code
            }
            Err(e) => {
                error!(%destination, error = %e, "Error on sending POST: {}", e.code());
                e.code()
            }
        };

        self.rule.classify(code)
    }
}
