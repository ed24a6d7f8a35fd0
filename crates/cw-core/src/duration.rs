//! `HH:MM:SS` duration codec.
//!
//! Durations here are display data. Parsing is lenient: anything that is not
//! a well-formed `H:MM:SS` string becomes zero instead of an error.

use chrono::Duration;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3600;

/// Parses `H{1,}:MM:SS` into a duration, returning zero on any malformed input.
pub fn parse_hms(text: &str) -> Duration {
    try_parse_hms(text).unwrap_or_else(Duration::zero)
}

fn try_parse_hms(text: &str) -> Option<Duration> {
    let mut parts = text.split(':');
    let (hours, minutes, seconds) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let hours = digits(hours, None)?;
    let minutes = digits(minutes, Some(2))?;
    let seconds = digits(seconds, Some(2))?;
    if minutes >= SECONDS_PER_MINUTE || seconds >= SECONDS_PER_MINUTE {
        return None;
    }

    let total = hours
        .checked_mul(SECONDS_PER_HOUR)?
        .checked_add(minutes * SECONDS_PER_MINUTE + seconds)?;
    Duration::try_seconds(total)
}

/// Parses an all-ASCII-digit field, optionally of an exact width.
fn digits(field: &str, width: Option<usize>) -> Option<i64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if width.is_some_and(|w| field.len() != w) {
        return None;
    }
    field.parse().ok()
}

/// Formats a duration as `HH:MM:SS`.
///
/// Hours are padded to two digits and grow past two when needed.
/// Negative durations render as `00:00:00`.
pub fn format_hms(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let hours = total / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = total % SECONDS_PER_MINUTE;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

pub(crate) const fn zero() -> Duration {
    Duration::zero()
}

/// Serde adapter storing a [`Duration`] as `HH:MM:SS`.
pub mod serde_hms {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_hms(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Ok(super::parse_hms(&text))
    }
}
