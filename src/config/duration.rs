//! Duration strings such as `12h`, `1h30m` or `500ms`.

use std::time::Duration;

use thiserror::Error;

/// Interval used when the configured one is missing or unusable.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },
}

fn unit_nanos(unit: &str) -> Option<f64> {
    Some(match unit {
        "ns" => 1.0,
        "us" | "µs" | "μs" => 1e3,
        "ms" => 1e6,
        "s" => 1e9,
        "m" => 60.0 * 1e9,
        "h" => 3600.0 * 1e9,
        _ => return None,
    })
}

/// Parse a sequence of `<number><unit>` groups.
///
/// Decimal fractions are allowed (`1.5h`). Signs are not: intervals are
/// never negative.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let invalid = || DurationError::Invalid(input.to_string());
    let mut rest = s;
    let mut total_nanos = 0f64;

    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(num_len);
        if number.is_empty() || number == "." {
            return Err(invalid());
        }
        let value: f64 = number.parse().map_err(|_| invalid())?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        total_nanos += value * scale;
        rest = next;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

/// Refresh interval from configuration, falling back to 12 hours.
pub fn refresh_interval_or_default(raw: &str) -> Duration {
    match parse_duration(raw) {
        Ok(d) if !d.is_zero() => d,
        Ok(_) => {
            tracing::warn!(refresh_interval = %raw, "Refresh interval must be positive, using 12h");
            DEFAULT_REFRESH_INTERVAL
        }
        Err(e) => {
            tracing::warn!(refresh_interval = %raw, error = %e, "Invalid refresh interval, using 12h");
            DEFAULT_REFRESH_INTERVAL
        }
    }
}
