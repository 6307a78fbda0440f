//! Lifetime strings such as `"24h"`, `"15m"` or `"7d"`
//!
//! A bare number is read as seconds. Supported units: `ms`, `s`, `m`, `h`,
//! `d`, `w` and their long forms (`sec`, `min`, `hours`, `days`, ...).

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static LIFETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\s*([a-z]*)$").expect("Invalid lifetime regex")
});

/// Parse a lifetime string into a `Duration`
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tw_shared::parse_lifetime;
///
/// assert_eq!(parse_lifetime("24h").unwrap(), Duration::from_secs(86_400));
/// assert_eq!(parse_lifetime("90").unwrap(), Duration::from_secs(90));
/// ```
pub fn parse_lifetime(input: &str) -> Result<Duration, String> {
    let normalized = input.trim().to_lowercase();
    let captures = LIFETIME_REGEX
        .captures(&normalized)
        .ok_or_else(|| format!("Unrecognized lifetime: {:?}", input))?;

    let amount: u64 = captures[1]
        .parse()
        .map_err(|_| format!("Lifetime amount out of range: {:?}", input))?;

    let unit_seconds: u64 = match &captures[2] {
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => {
            return Ok(Duration::from_millis(amount));
        }
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 60 * 60,
        "d" | "day" | "days" => 24 * 60 * 60,
        "w" | "week" | "weeks" => 7 * 24 * 60 * 60,
        unit => return Err(format!("Unknown lifetime unit: {:?}", unit)),
    };

    amount
        .checked_mul(unit_seconds)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("Lifetime amount out of range: {:?}", input))
}
