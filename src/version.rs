//! Firmware version parsing and its packed LoRa representation.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Firmware version in `V<major>.<minor>.<patch>` form.
///
/// HTTP backends receive the original string verbatim, the LoRa frame gets
/// the packed 16-bit form from [`FirmwareVersion::lora_code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareVersion {
    raw: String,
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Errors returned when parsing a firmware version string.
#[derive(Error, Debug, PartialEq)]
pub enum ParseVersionError {
    #[error("invalid firmware version '{0}': expected leading 'V'")]
    MissingPrefix(String),
    #[error("invalid firmware version '{0}': expected 3 parts, got {1}")]
    InvalidLength(String, usize),
    #[error("invalid firmware version: '{0}' is not a number")]
    InvalidNumber(String),
}

impl FirmwareVersion {
    /// The version string exactly as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `(major << 12) + (minor << 4) + patch`, truncated to 16 bits.
    pub fn lora_code(&self) -> u16 {
        (self.major << 12)
            .wrapping_add(self.minor << 4)
            .wrapping_add(self.patch) as u16
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for FirmwareVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('V')
            .ok_or_else(|| ParseVersionError::MissingPrefix(s.to_string()))?;

        let parts: Vec<&str> = digits.split('.').collect();
        if parts.len() != 3 {
            return Err(ParseVersionError::InvalidLength(s.to_string(), parts.len()));
        }

        let mut numbers = [0u32; 3];
        for (i, part) in parts.iter().enumerate() {
            numbers[i] = part
                .parse()
                .map_err(|_| ParseVersionError::InvalidNumber(part.to_string()))?;
        }

        Ok(FirmwareVersion {
            raw: s.to_string(),
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_version() {
        let version: FirmwareVersion = "V1.17.3".parse().unwrap();
        assert_eq!((version.major, version.minor, version.patch), (1, 17, 3));
        assert_eq!(version.as_str(), "V1.17.3");
        assert_eq!(version.to_string(), "V1.17.3");
    }

    #[test]
    fn lora_code_packs_fields() {
        let version: FirmwareVersion = "V1.17.3".parse().unwrap();
        assert_eq!(version.lora_code(), 0x1113);
    }

    #[test]
    fn lora_code_truncates_to_16_bits() {
        let version: FirmwareVersion = "V17.0.0".parse().unwrap();
        assert_eq!(version.lora_code(), 0x1000);
    }

    #[test]
    fn lora_code_wraps_huge_parts() {
        let version: FirmwareVersion = "V4294967295.4294967295.15".parse().unwrap();
        assert_eq!(version.lora_code(), 0xEFFF);
    }

    #[test]
    fn parse_missing_prefix() {
        assert_eq!(
            "1.2.3".parse::<FirmwareVersion>(),
            Err(ParseVersionError::MissingPrefix("1.2.3".to_string()))
        );
    }

    #[test]
    fn parse_wrong_part_count() {
        assert_eq!(
            "V1.2".parse::<FirmwareVersion>(),
            Err(ParseVersionError::InvalidLength("V1.2".to_string(), 2))
        );
    }

    #[test]
    fn parse_non_numeric() {
        assert_eq!(
            "V1.x.3".parse::<FirmwareVersion>(),
            Err(ParseVersionError::InvalidNumber("x".to_string()))
        );
    }

    #[test]
    fn error_display() {
        let err = ParseVersionError::InvalidNumber("x".to_string());
        assert_eq!(format!("{err}"), "invalid firmware version: 'x' is not a number");
    }
}
