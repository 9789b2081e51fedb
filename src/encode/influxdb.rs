//! InfluxDB line protocol body.

use crate::snapshot::MeasurementSnapshot;
use std::fmt;

/// Field values for InfluxDB line protocol
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Written as a bare integer (no `i` suffix)
    Integer(i64),
    /// Written with six decimals
    Float(f64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Integer(num) => write!(f, "{num}"),
            FieldValue::Float(num) => write!(f, "{num:.6}"),
        }
    }
}

/// Data point in InfluxDB line protocol.
///
/// Fields keep their insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub measurement: String,
    pub field_set: Vec<(&'static str, FieldValue)>,
}

impl DataPoint {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            field_set: Vec::new(),
        }
    }

    pub fn field(mut self, key: &'static str, value: FieldValue) -> Self {
        self.field_set.push((key, value));
        self
    }
}

fn fmt_fields(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    let mut first = true;
    for (key, value) in data_point.field_set.iter() {
        if first {
            first = false;
        } else {
            write!(fmt, ",")?;
        }
        write!(fmt, "{}={}", key, value)?;
    }
    Ok(())
}

impl fmt::Display for DataPoint {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{} ", self.measurement)?;
        fmt_fields(self, fmt)
    }
}

/// Build the data point for one snapshot.
///
/// Environment fields are appended to the same point when present.
pub fn data_point(snapshot: &MeasurementSnapshot, measurement: &str) -> DataPoint {
    let mut point = DataPoint::new(measurement)
        .field("cpm", FieldValue::Integer(snapshot.cpm.into()))
        .field("hv_pulses", FieldValue::Integer(snapshot.hv_pulses.into()))
        .field("gm_count", FieldValue::Integer(snapshot.counts.into()))
        .field("timediff", FieldValue::Integer(snapshot.interval_ms.into()))
        .field("dose_rate", FieldValue::Float(snapshot.dose_rate));

    if let Some(environment) = &snapshot.environment {
        point = point
            .field("temperature", FieldValue::Float(environment.temperature))
            .field("humidity", FieldValue::Float(environment.humidity))
            .field("pressure", FieldValue::Float(environment.pressure));
    }

    point
}

/// Render the newline-terminated request body.
pub fn influx_line(snapshot: &MeasurementSnapshot, measurement: &str) -> String {
    format!("{}\n", data_point(snapshot, measurement))
}
