//! Benchmark of a full transmission cycle.
//!
//! Every HTTP destination is enabled and answers instantly, so the numbers
//! cover encoding, header assembly and status bookkeeping.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use multigeiger_transmission::channel::{HttpRequest, HttpResponse};
use multigeiger_transmission::{
    ConfigError, Destination, Dispatcher, Environment, HttpTransport, MeasurementSnapshot,
    StatusDisplay, StatusTracker, TransmissionConfig, TransportError, TransportFactory, WifiStatus,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Transport answering every request with the status the backend expects.
struct InstantTransport {
    status: u16,
}

impl HttpTransport for InstantTransport {
    fn post(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + '_>> {
        let status = self.status;
        Box::pin(async move {
            black_box(request);
            Ok(HttpResponse {
                status,
                body: String::new(),
            })
        })
    }
}

struct InstantTransports;

impl TransportFactory for InstantTransports {
    fn transport(&self, destination: Destination) -> Result<Box<dyn HttpTransport>, ConfigError> {
        let status = match destination {
            Destination::SensorCommunity => 201,
            Destination::InfluxDb => 204,
            _ => 200,
        };
        Ok(Box::new(InstantTransport { status }))
    }
}

struct NoDisplay;

impl StatusDisplay for NoDisplay {
    fn refresh(&self, _status: &StatusTracker) {}
}

fn config() -> TransmissionConfig {
    let mut config = TransmissionConfig::new(
        "V1.17.3".parse().expect("valid version"),
        "esp32-51564452",
    );
    config.http_spacing = Duration::ZERO;
    config.custom_server.enabled = true;
    config.madavi.enabled = true;
    config.sensor_community.enabled = true;
    config.influx.destination.enabled = true;
    config.influx.destination.url = "http://influx.local:8086/write?db=geiger".to_string();
    config
}

fn snapshot(environment: Option<Environment>) -> MeasurementSnapshot {
    MeasurementSnapshot {
        tube_type: "Radiation SBM-20".to_string(),
        tube_index: 1,
        interval_ms: 60_000,
        hv_pulses: 7,
        counts: 43,
        cpm: 42,
        dose_rate: 0.2394,
        environment,
        wifi: WifiStatus::Connected,
    }
}

fn bench_transmit(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let dispatcher = Dispatcher::new(&config(), &InstantTransports, None, Arc::new(NoDisplay))
        .expect("dispatcher");

    let mut group = c.benchmark_group("transmit");
    group.throughput(Throughput::Elements(1));

    let cases = [
        ("geiger_only", snapshot(None)),
        (
            "with_environment",
            snapshot(Some(Environment {
                temperature: 21.5,
                humidity: 45.25,
                pressure: 101_325.0,
            })),
        ),
    ];

    for (name, snapshot) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), &snapshot, |b, snapshot| {
            b.iter(|| rt.block_on(async { black_box(dispatcher.transmit(snapshot).await) }))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_transmit);
criterion_main!(benches);
