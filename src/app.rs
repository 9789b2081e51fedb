//! Core application runner for `multigeiger-transmission`.
//!
//! Decoupled from process setup (logging, exit codes) so it can be tested
//! deterministically with injected snapshot sources and transports.

use crate::channel::{ReqwestTransports, TransportFactory};
use crate::config::{
    CUSTOM_SERVER_URL, ConfigError, InfluxConfig, LoraCredentials, MADAVI_URL,
    SENSOR_COMMUNITY_URL, TransmissionConfig, device_id_from_ssid,
};
use crate::destination::{Destination, DestinationConfig};
use crate::dispatcher::Dispatcher;
use crate::duration::parse_duration;
use crate::poller::MIN_POLL_INTERVAL;
use crate::snapshot::MeasurementSnapshot;
use crate::status::LogDisplay;
use crate::version::FirmwareVersion;
use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Firmware version reported when none is configured.
pub const DEFAULT_FIRMWARE_VERSION: &str = concat!("V", env!("CARGO_PKG_VERSION"));

/// Channel buffer size for incoming snapshots.
pub const SNAPSHOT_CHANNEL_BUFFER_SIZE: usize = 16;

/// Command line configuration.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// Firmware version sent to the backends, e.g. V1.17.3
    #[arg(long, env = "MULTIGEIGER_FIRMWARE_VERSION", default_value = DEFAULT_FIRMWARE_VERSION)]
    pub firmware_version: FirmwareVersion,

    /// Access point SSID of the device; it becomes the X-Sensor identity.
    #[arg(long, env = "MULTIGEIGER_SSID", default_value = "ESP32-0")]
    pub ssid: String,

    /// Log request and response bodies of every HTTP delivery
    #[arg(long)]
    pub debug_server_send: bool,

    /// Pause after Madavi and sensor.community deliveries.
    /// Accepts duration with suffix: 300ms, 1s.
    #[arg(long, value_parser = parse_duration, default_value = "300ms")]
    pub http_spacing: Duration,

    /// Period of the LoRa stack poll task, capped at 10ms. Only used when a
    /// radio stack is attached.
    #[arg(long, value_parser = parse_duration, default_value = "10ms")]
    pub poll_interval: Duration,

    /// PEM file with extra root certificates for HTTPS
    #[arg(long, env = "MULTIGEIGER_CA_BUNDLE")]
    pub ca_bundle: Option<PathBuf>,

    /// Send to the custom debug server
    #[arg(long)]
    pub send_to_custom_server: bool,

    #[arg(long, env = "MULTIGEIGER_CUSTOM_SERVER", default_value = CUSTOM_SERVER_URL)]
    pub custom_server_url: String,

    /// Send to Madavi
    #[arg(long)]
    pub send_to_madavi: bool,

    #[arg(long, env = "MULTIGEIGER_MADAVI", default_value = MADAVI_URL)]
    pub madavi_url: String,

    /// Send to sensor.community
    #[arg(long)]
    pub send_to_sensor_community: bool,

    #[arg(long, env = "MULTIGEIGER_SENSOR_COMMUNITY", default_value = SENSOR_COMMUNITY_URL)]
    pub sensor_community_url: String,

    /// Send to TTN over LoRaWAN. This binary links no radio stack, so TTN
    /// stays off with a warning; embedders pass a stack to `Dispatcher::new`.
    #[arg(long)]
    pub send_to_lora: bool,

    /// LoRaWAN AppEUI; uplinks are only attempted when set
    #[arg(long, env = "MULTIGEIGER_LORA_APP_EUI", default_value = "")]
    pub lora_app_eui: String,

    /// LoRaWAN DevEUI, for the radio stack's join
    #[arg(long, env = "MULTIGEIGER_LORA_DEV_EUI", default_value = "")]
    pub lora_dev_eui: String,

    /// LoRaWAN AppKey, for the radio stack's join
    #[arg(long, env = "MULTIGEIGER_LORA_APP_KEY", default_value = "", hide_env_values = true)]
    pub lora_app_key: String,

    /// Send to InfluxDB
    #[arg(long)]
    pub send_to_influx: bool,

    /// InfluxDB write endpoint, e.g. http://host:8086/write?db=geiger
    #[arg(long, env = "MULTIGEIGER_INFLUX_URL", default_value = "")]
    pub influx_url: String,

    /// The name of the measurement in InfluxDB line protocol.
    #[arg(long, default_value = "geiger")]
    pub influx_measurement: String,

    #[arg(long, env = "MULTIGEIGER_INFLUX_USER", default_value = "")]
    pub influx_user: String,

    #[arg(long, env = "MULTIGEIGER_INFLUX_PASSWORD", default_value = "", hide_env_values = true)]
    pub influx_password: String,

    /// Verbose output, report unreadable snapshots and debug logs
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Options {
    pub fn to_config(&self) -> TransmissionConfig {
        TransmissionConfig {
            firmware_version: self.firmware_version.clone(),
            device_id: device_id_from_ssid(&self.ssid),
            debug_server_send: self.debug_server_send,
            http_spacing: self.http_spacing,
            ca_bundle: self.ca_bundle.clone(),
            custom_server: DestinationConfig::new(
                Destination::CustomServer,
                self.send_to_custom_server,
                &self.custom_server_url,
            ),
            madavi: DestinationConfig::new(Destination::Madavi, self.send_to_madavi, &self.madavi_url),
            sensor_community: DestinationConfig::new(
                Destination::SensorCommunity,
                self.send_to_sensor_community,
                &self.sensor_community_url,
            ),
            ttn: DestinationConfig::new(Destination::Ttn, self.send_to_lora, ""),
            lora: LoraCredentials {
                app_eui: self.lora_app_eui.clone(),
                dev_eui: self.lora_dev_eui.clone(),
                app_key: self.lora_app_key.clone(),
            },
            influx: InfluxConfig {
                destination: DestinationConfig::new(
                    Destination::InfluxDb,
                    self.send_to_influx,
                    &self.influx_url,
                ),
                measurement: self.influx_measurement.clone(),
                user: self.influx_user.clone(),
                password: self.influx_password.clone(),
            },
        }
    }
}

/// Errors reading snapshots.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error("Input error: {0}")]
    Io(String),
}

/// Convenience alias for parsed snapshots or read errors.
pub type SnapshotResult = Result<MeasurementSnapshot, SourceError>;

/// Errors returned by the run loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Producer of measurement snapshots, one per cycle.
pub trait SnapshotSource: Send + Sync {
    fn start(&self) -> mpsc::Receiver<SnapshotResult>;
}

/// Reads one JSON snapshot per line.
pub struct JsonLinesSource<R> {
    reader: Mutex<Option<R>>,
}

impl<R> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
        }
    }
}

impl JsonLinesSource<tokio::io::Stdin> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

impl<R> SnapshotSource for JsonLinesSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Start reading. A source can be started once; later calls yield a
    /// closed channel.
    fn start(&self) -> mpsc::Receiver<SnapshotResult> {
        let (tx, rx) = mpsc::channel(SNAPSHOT_CHANNEL_BUFFER_SIZE);
        let reader = self.reader.lock().ok().and_then(|mut reader| reader.take());

        if let Some(reader) = reader {
            tokio::spawn(async move {
                let mut lines = BufReader::new(reader).lines();
                loop {
                    let result = match lines.next_line().await {
                        Ok(Some(line)) if line.trim().is_empty() => continue,
                        Ok(Some(line)) => serde_json::from_str(&line)
                            .map_err(|e| SourceError::InvalidSnapshot(e.to_string())),
                        Ok(None) => break,
                        Err(e) => Err(SourceError::Io(e.to_string())),
                    };
                    let stop = matches!(result, Err(SourceError::Io(_)));
                    if tx.send(result).await.is_err() || stop {
                        break;
                    }
                }
            });
        }

        rx
    }
}

/// What a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Snapshots transmitted
    pub cycles: usize,
    /// Lines that could not be read as snapshots
    pub rejected: usize,
}

/// Transmit every snapshot from `source` until it is exhausted.
///
/// While running, the radio poller ticks on its own task every
/// `poll_interval` (capped at [`MIN_POLL_INTERVAL`]).
pub async fn run_with_io(
    dispatcher: &Dispatcher,
    source: &dyn SnapshotSource,
    poll_interval: Duration,
    verbose: bool,
) -> RunSummary {
    let period = match poll_interval {
        Duration::ZERO => MIN_POLL_INTERVAL,
        interval => interval.min(MIN_POLL_INTERVAL),
    };
    let poller = dispatcher.poller();
    let poll_task = poller.is_active().then(|| tokio::spawn(poller.run(period)));

    let mut summary = RunSummary::default();
    let mut snapshots = source.start();

    while let Some(result) = snapshots.recv().await {
        match result {
            Ok(snapshot) => {
                let report = dispatcher.transmit(&snapshot).await;
                summary.cycles += 1;
                debug!(
                    attempted = report.attempts.len(),
                    ok = report.all_succeeded(),
                    "cycle done"
                );
            }
            Err(error) => {
                summary.rejected += 1;
                if verbose {
                    warn!("{error}");
                }
            }
        }
    }

    if let Some(task) = poll_task {
        task.abort();
    }

    summary
}

/// Build everything from the command line and run on stdin.
pub async fn run(options: Options) -> Result<RunSummary, RunError> {
    let config = options.to_config();
    let transports = ReqwestTransports::from_config(&config)?;
    run_with_transports(&options, &config, &transports, &JsonLinesSource::stdin()).await
}

async fn run_with_transports(
    options: &Options,
    config: &TransmissionConfig,
    transports: &dyn TransportFactory,
    source: &dyn SnapshotSource,
) -> Result<RunSummary, RunError> {
    // No LoRa stack is linked into this binary, so TTN stays off.
    let dispatcher = Dispatcher::new(config, transports, None, Arc::new(LogDisplay))?;
    Ok(run_with_io(&dispatcher, source, options.poll_interval, options.verbose).await)
}
