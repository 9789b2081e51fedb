//! JSON over HTTP(S) client and the reqwest-backed transport.

use super::{
    DeliveryOutcome, HttpRequest, HttpResponse, HttpTransport, SuccessRule, TransportError,
    TransportFactory,
};
use crate::config::{ConfigError, TransmissionConfig};
use crate::destination::{Destination, DestinationConfig};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, error};

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// `X-PIN` header value telling sensor.community which sensor sent the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XPin(pub u16);

impl XPin {
    pub const BME280: XPin = XPin(11);
    pub const RADIATION: XPin = XPin(19);
}

impl fmt::Display for XPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            TransportError::ConnectionLost(e.to_string())
        } else {
            TransportError::Send(e.to_string())
        }
    }
}

/// Transport backed by a `reqwest::Client`.
///
/// The client is built once and reused for every request of its destination.
/// Plain HTTP or TLS is picked from the URL scheme.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(root_certificate: Option<&reqwest::Certificate>) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(certificate) = root_certificate {
            builder = builder.add_root_certificate(certificate.clone());
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn post(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + '_>> {
        Box::pin(async move {
            let mut builder = self.client.post(&request.url).body(request.body);
            for (name, value) in &request.headers {
                builder = builder.header(*name, value.as_str());
            }
            if let Some(credentials) = request.basic_auth {
                builder = builder.basic_auth(credentials.user, Some(credentials.password));
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();
            // Draining the body hands the connection back to the pool.
            let body = response.text().await.unwrap_or_default();

            Ok(HttpResponse { status, body })
        })
    }
}

/// Builds one [`ReqwestTransport`] per destination, sharing the CA bundle.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransports {
    root_certificate: Option<reqwest::Certificate>,
}

impl ReqwestTransports {
    pub fn from_config(config: &TransmissionConfig) -> Result<Self, ConfigError> {
        let root_certificate = match &config.ca_bundle {
            Some(path) => {
                let pem = std::fs::read(path).map_err(|source| ConfigError::CaBundle {
                    path: path.clone(),
                    source,
                })?;
                let certificate = reqwest::Certificate::from_pem(&pem)
                    .map_err(|e| ConfigError::Certificate(e.to_string()))?;
                Some(certificate)
            }
            None => None,
        };
        Ok(Self { root_certificate })
    }
}

impl TransportFactory for ReqwestTransports {
    fn transport(&self, _destination: Destination) -> Result<Box<dyn HttpTransport>, ConfigError> {
        Ok(Box::new(ReqwestTransport::new(
            self.root_certificate.as_ref(),
        )?))
    }
}

/// Client for the `sensordatavalues` JSON backends.
pub struct JsonClient {
    destination: Destination,
    url: String,
    device_id: String,
    debug: bool,
    rule: SuccessRule,
    transport: Box<dyn HttpTransport>,
}

impl JsonClient {
    pub fn new(
        destination: &DestinationConfig,
        config: &TransmissionConfig,
        transport: Box<dyn HttpTransport>,
    ) -> Self {
        Self {
            destination: destination.destination,
            url: destination.url.clone(),
            device_id: config.device_id.clone(),
            debug: config.debug_server_send,
            rule: SuccessRule::for_destination(destination.destination),
            transport,
        }
    }

    fn request(&self, body: String, xpin: Option<XPin>) -> HttpRequest {
        let mut headers = vec![
            ("Content-Type", JSON_CONTENT_TYPE.to_string()),
            ("Connection", "keep-alive".to_string()),
            ("X-Sensor", self.device_id.clone()),
        ];
        if let Some(xpin) = xpin {
            headers.push(("X-PIN", xpin.to_string()));
        }

        HttpRequest {
            url: self.url.clone(),
            headers,
            body,
            basic_auth: None,
        }
    }

    /// POST one JSON body. Resolves once the connection has been released.
    pub async fn deliver(&self, body: String, xpin: Option<XPin>) -> DeliveryOutcome {
        let destination = self.destination;
        if self.debug {
            debug!(%destination, "http request body: {body}");
        }

        let code = match self.transport.post(self.request(body, xpin)).await {
            Ok(response) => {
                let code = i32::from(response.status);
                if self.debug {
                    debug!(%destination, "http code: {code}");
                    debug!(%destination, "http response: {}", response.body);
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
