//! Human-readable durations for the command line.

use std::time::Duration;

/// Parse a duration such as `300ms`, `10s`, `2m` or `1h`.
///
/// A bare number is taken as seconds.
///
/// # Examples
/// ```
/// use multigeiger_transmission::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("300ms").unwrap(), Duration::from_millis(300));
/// assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
/// assert_eq!(parse_duration("5").unwrap(), Duration::from_secs(5));
/// ```
pub fn parse_duration(src: &str) -> Result<Duration, String> {
    let src = src.trim();
    if src.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Milliseconds per unit. "ms" must be tried before "m" and "s".
    const UNITS: [(&str, u64, &str); 4] = [
        ("ms", 1, "milliseconds"),
        ("h", 3_600_000, "hours"),
        ("m", 60_000, "minutes"),
        ("s", 1_000, "seconds"),
    ];

    for (suffix, millis, unit) in UNITS {
        if let Some(num) = src.strip_suffix(suffix) {
            let value: u64 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid {unit}: {num}"))?;
            return value
                .checked_mul(millis)
                .map(Duration::from_millis)
                .ok_or_else(|| format!("{unit} out of range: {}", num.trim()));
        }
    }

    let secs: u64 = src
        .parse()
        .map_err(|_| format!("invalid duration: {src}"))?;
    Ok(Duration::from_secs(secs))
}
