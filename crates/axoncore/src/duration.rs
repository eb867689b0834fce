use crate::CoreError;
use std::time::Duration;

/// Parse a duration string such as `"300ms"`, `"5s"`, `"2m"` or `"1m30s"`.
///
/// Accepts a sequence of decimal numbers, each with an optional fraction
/// and a mandatory unit suffix (`ns`, `us`, `ms`, `s`, `m`, `h`); segments
/// are summed. An empty string or a bare number is rejected.
pub fn parse_duration(input: &str) -> Result<Duration, CoreError> {
    let invalid = || CoreError::InvalidDuration(input.to_string());
    let s = input.trim();
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .ok_or_else(invalid)?;
        if num_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..num_len].parse().map_err(|_| invalid())?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit_secs = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        total += Duration::from_secs_f64(value * unit_secs);
    }

    Ok(total)
}
