//! Binary LoRaWAN uplink frames.
//!
//! Airtime is scarce, so frames carry fixed-width big-endian fields only; units
//! and labels are restored by the downstream decoder. The frame type doubles
//! as the LoRaWAN port.

use crate::snapshot::{Environment, MeasurementSnapshot};

/// Frame type tag, also used as the uplink port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    Geiger = 1,
    Environment = 2,
}

impl FrameType {
    pub fn port(self) -> u8 {
        self as u8
    }
}

/// Largest interval representable in the 3-byte field (about 4h 39m).
pub const MAX_INTERVAL_MS: u32 = 0x00FF_FFFF;

/// Geiger frame: counts(4) | interval ms(3) | firmware version(2) | tube index(1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeigerFrame {
    pub counts: u32,
    /// Interval modulo 2^24
    pub interval_ms: u32,
    pub version: u16,
    pub tube_index: u8,
}

impl GeigerFrame {
    pub const LEN: usize = 10;

    pub fn new(snapshot: &MeasurementSnapshot, version: u16) -> Self {
        Self {
            counts: snapshot.counts,
            interval_ms: snapshot.interval_ms & MAX_INTERVAL_MS,
            version,
            tube_index: snapshot.tube_index,
        }
    }

    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut frame = [0u8; Self::LEN];
        frame[0..4].copy_from_slice(&self.counts.to_be_bytes());
        frame[4..7].copy_from_slice(&self.interval_ms.to_be_bytes()[1..]);
        frame[7..9].copy_from_slice(&self.version.to_be_bytes());
        frame[9] = self.tube_index;
        frame
    }

    pub fn decode(frame: &[u8; Self::LEN]) -> Self {
        Self {
            counts: u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]),
            interval_ms: u32::from_be_bytes([0, frame[4], frame[5], frame[6]]),
            version: u16::from_be_bytes([frame[7], frame[8]]),
            tube_index: frame[9],
        }
    }
}

/// Environment frame: temperature x10 (i16) | humidity x2 (u8) | pressure / 10 (u16).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentFrame {
    /// Tenths of a degree Celsius
    pub temperature: i16,
    /// Half percent steps
    pub humidity: u8,
    /// Tens of Pascals
    pub pressure: u16,
}

impl EnvironmentFrame {
    pub const LEN: usize = 5;

    /// Scale the readings. Conversions truncate toward zero and saturate at
    /// the field limits.
    pub fn new(environment: &Environment) -> Self {
        Self {
            temperature: (environment.temperature * 10.0) as i16,
            humidity: (environment.humidity * 2.0) as u8,
            pressure: (environment.pressure / 10.0) as u16,
        }
    }

    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut frame = [0u8; Self::LEN];
        frame[0..2].copy_from_slice(&self.temperature.to_be_bytes());
        frame[2] = self.humidity;
        frame[3..5].copy_from_slice(&self.pressure.to_be_bytes());
        frame
    }

    pub fn decode(frame: &[u8; Self::LEN]) -> Self {
        Self {
            temperature: i16::from_be_bytes([frame[0], frame[1]]),
            humidity: frame[2],
            pressure: u16::from_be_bytes([frame[3], frame[4]]),
        }
    }

    pub fn temperature_celsius(&self) -> f64 {
        f64::from(self.temperature) / 10.0
    }

    pub fn humidity_percent(&self) -> f64 {
        f64::from(self.humidity) / 2.0
    }

    pub fn pressure_pascals(&self) -> f64 {
        f64::from(self.pressure) * 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{base_snapshot, test_environment};

    #[test]
    fn geiger_frame_layout() {
        let mut snapshot = base_snapshot();
        snapshot.counts = 0x0102_0304;
        snapshot.interval_ms = 0x0005_0607;
        snapshot.tube_index = 0x0A;

        let frame = GeigerFrame::new(&snapshot, 0x1113).encode();

        assert_eq!(
            frame,
            [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x11, 0x13, 0x0A]
        );
    }

    #[test]
    fn geiger_frame_truncates_interval_to_three_bytes() {
        let mut snapshot = base_snapshot();
        snapshot.interval_ms = 0x1234_5678;

        let frame = GeigerFrame::new(&snapshot, 0).encode();
        assert_eq!(&frame[4..7], &[0x34, 0x56, 0x78]);

        let decoded = GeigerFrame::decode(&frame);
        assert_eq!(decoded.interval_ms, 0x1234_5678 % (1 << 24));
    }

    #[test]
    fn geiger_frame_round_trip() {
        let snapshot = base_snapshot();
        let frame = GeigerFrame::new(&snapshot, 0x1113);
        let decoded = GeigerFrame::decode(&frame.encode());

        assert_eq!(decoded, frame);
        assert_eq!(decoded.counts, snapshot.counts);
        assert_eq!(decoded.interval_ms, snapshot.interval_ms);
        assert_eq!(decoded.tube_index, snapshot.tube_index);
        assert_eq!(decoded.version >> 12, 1);
        assert_eq!((decoded.version >> 4) & 0xFF, 17);
        assert_eq!(decoded.version & 0x0F, 3);
    }

    #[test]
    fn environment_frame_layout() {
        let frame = EnvironmentFrame::new(&test_environment()).encode();
        // 215 = 0x00D7, 90 = 0x5A, 10132 = 0x2794
        assert_eq!(frame, [0x00, 0xD7, 0x5A, 0x27, 0x94]);
    }

    #[test]
    fn environment_frame_negative_temperature() {
        let environment = Environment {
            temperature: -12.3,
            humidity: 80.0,
            pressure: 98000.0,
        };
        let frame = EnvironmentFrame::new(&environment).encode();
        assert_eq!(&frame[0..2], &(-123i16).to_be_bytes());

        let decoded = EnvironmentFrame::decode(&frame);
        assert!((decoded.temperature_celsius() - -12.3).abs() <= 0.1);
    }

    #[test]
    fn environment_frame_round_trip_within_resolution() {
        let environment = Environment {
            temperature: 23.47,
            humidity: 55.9,
            pressure: 100_457.0,
        };
        let decoded = EnvironmentFrame::decode(&EnvironmentFrame::new(&environment).encode());

        assert!((decoded.temperature_celsius() - environment.temperature).abs() <= 0.1);
        assert!((decoded.humidity_percent() - environment.humidity).abs() <= 0.5);
        assert!((decoded.pressure_pascals() - environment.pressure).abs() <= 10.0);
    }

    #[test]
    fn frame_ports() {
        assert_eq!(FrameType::Geiger.port(), 1);
        assert_eq!(FrameType::Environment.port(), 2);
    }
}
