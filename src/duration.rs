/*
 * duration.rs
 *
 * Parse "30s", "5m", "1.5h", "0.5d", "250ms". No suffix means seconds.
 * Zero means run forever. Case insensitive.
 *
 * Only digits and '.' make up the number, so "-5" has no numeric prefix
 * and fails like any other garbage.
 */

use std::time::Duration;

use crate::error::{Result, TimeoutError};

const NANOS_PER_MS: f64 = 1e6;
const NANOS_PER_SEC: f64 = 1e9;

/* largest representable duration in nanos, ~584 years */
#[allow(clippy::cast_precision_loss)]
const MAX_NANOS: f64 = u64::MAX as f64;

/// Parse "30", "30s", "1.5m", "2h", "0.5d", "1500ms". No suffix = seconds.
///
/// # Examples
///
/// ```
/// use unix_timeout::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
/// assert_eq!(parse_duration("1.5m").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_duration("1500ms").unwrap(), parse_duration("1.5s").unwrap());
/// assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
/// ```
pub fn parse_duration(input: &str) -> Result<Duration> {
    let trimmed = input.trim();
    let invalid = || TimeoutError::InvalidDuration(input.to_string());

    let (num_str, suffix) = split_number_and_suffix(trimmed);
    if num_str.is_empty() {
        return Err(invalid());
    }

    /* "1.2.3" and "." fail here */
    let value: f64 = num_str.parse().map_err(|_| invalid())?;

    let unit_nanos = match suffix.to_ascii_lowercase().as_str() {
        "" | "s" => NANOS_PER_SEC,
        "ms" => NANOS_PER_MS,
        "m" => 60.0 * NANOS_PER_SEC,
        "h" => 3600.0 * NANOS_PER_SEC,
        "d" => 86400.0 * NANOS_PER_SEC,
        _ => return Err(invalid()),
    };

    /* work in nanos so "1500ms" and "1.5s" land on the same value */
    let nanos = (value * unit_nanos).round();
    if !nanos.is_finite() || nanos > MAX_NANOS {
        return Err(TimeoutError::DurationOverflow(input.to_string()));
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(Duration::from_nanos(nanos as u64))
}

/* leading run of digits and dots is the number, the rest is the unit */
fn split_number_and_suffix(input: &str) -> (&str, &str) {
    let end = input
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(input.len());
    input.split_at(end)
}

/* zero duration = no timeout, run forever */
#[must_use]
pub const fn is_no_timeout(duration: &Duration) -> bool {
    duration.is_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("30S").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("1.5m").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("2M").unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn test_parse_hours_and_days() {
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86400));
        assert_eq!(parse_duration("0.5D").unwrap(), Duration::from_secs(43200));
    }

    #[test]
    fn test_parse_milliseconds() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("1500MS").unwrap(), Duration::from_millis(1500));
        assert_eq!(
            parse_duration("1500ms").unwrap(),
            parse_duration("1.5s").unwrap()
        );
    }

    #[test]
    fn test_parse_fractional() {
        assert_eq!(parse_duration("0.5").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("0.001s").unwrap(), Duration::from_millis(1));
        assert_eq!(parse_duration(".5").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("2.").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn test_parse_zero() {
        assert!(is_no_timeout(&parse_duration("0").unwrap()));
        assert!(is_no_timeout(&parse_duration("0.0s").unwrap()));
        assert!(is_no_timeout(&parse_duration("0ms").unwrap()));
    }

    #[test]
    fn test_parse_whitespace() {
        assert_eq!(parse_duration("  30s  ").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_empty_prefix() {
        for input in ["", "   ", "s", "ms", "abc", "-5", "+5", "x1"] {
            assert!(
                matches!(parse_duration(input), Err(TimeoutError::InvalidDuration(_))),
                "{input:?} should be an invalid interval"
            );
        }
    }

    #[test]
    fn test_invalid_number() {
        assert!(matches!(
            parse_duration("1.2.3"),
            Err(TimeoutError::InvalidDuration(_))
        ));
        assert!(matches!(
            parse_duration("."),
            Err(TimeoutError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_invalid_suffix() {
        for input in ["30x", "1e3", "5 s", "10sec", "3w", "1us"] {
            assert!(
                matches!(parse_duration(input), Err(TimeoutError::InvalidDuration(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_error_keeps_original_input() {
        let err = parse_duration("10x").unwrap_err();
        assert_eq!(err.to_string(), "invalid time interval '10x'");
    }

    #[test]
    fn test_overflow() {
        assert!(matches!(
            parse_duration("99999999999999999999d"),
            Err(TimeoutError::DurationOverflow(_))
        ));
    }
}
