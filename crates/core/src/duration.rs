//! Human-friendly duration strings (`15m`, `5s`, `1h30m`, `250ms`, `1.5s`).
//!
//! Used for the run/grace/shutdown timeouts on the command line. A duration
//! is a sequence of decimal numbers, each with a unit suffix. Valid units
//! are `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. The bare string `0` is
//! also accepted.

use std::time::Duration;

use crate::error::DurationParseError;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Parse a duration string such as `"15m"` or `"1h2m3.5s"`.
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::Empty);
    }
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }

    let invalid = || DurationParseError::Invalid(input.to_string());
    let overflow = || DurationParseError::Overflow(input.to_string());

    let mut rest = trimmed;
    let mut total_nanos: u128 = 0;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        if number.is_empty() || number == "." || number.matches('.').count() > 1 {
            return Err(invalid());
        }

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);
        if unit.is_empty() {
            return Err(DurationParseError::MissingUnit(input.to_string()));
        }
        let unit_nanos = unit_to_nanos(unit).ok_or_else(|| DurationParseError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(unit_nanos).ok_or_else(overflow)?;

        if !frac.is_empty() {
            // Digits past nanosecond precision of an hour carry no weight.
            let digits = &frac[..frac.len().min(18)];
            let frac_value: u128 = digits.parse().map_err(|_| invalid())?;
            let scale = 10u128.pow(digits.len() as u32);
            nanos = nanos
                .checked_add(frac_value * unit_nanos / scale)
                .ok_or_else(overflow)?;
        }

        total_nanos = total_nanos.checked_add(nanos).ok_or_else(overflow)?;
        rest = next;
    }

    let secs = u64::try_from(total_nanos / NANOS_PER_SEC).map_err(|_| overflow())?;
    Ok(Duration::new(secs, (total_nanos % NANOS_PER_SEC) as u32))
}

fn unit_to_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
