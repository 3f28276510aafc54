// velxebot-core/src/utils/duration.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::Error;

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+)(s|m|h|d)$").expect("duration pattern compiles"));

/// Parses a giveaway duration like `"30s"`, `"10m"`, `"2h"` or `"1d"` into
/// milliseconds. The unit letter is case-insensitive.
pub fn parse_duration_ms(input: &str) -> Result<u64, Error> {
    let caps = DURATION_RE
        .captures(input)
        .ok_or_else(|| Error::InvalidDuration(input.to_string()))?;

    let value: u64 = caps[1]
        .parse()
        .map_err(|_| Error::InvalidDuration(input.to_string()))?;

    let multiplier: u64 = match caps[2].to_ascii_lowercase().as_str() {
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        _ => return Err(Error::InvalidDuration(input.to_string())),
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| Error::InvalidDuration(input.to_string()))
}
