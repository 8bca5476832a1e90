//! Event timestamps and their textual formats
//!
//! Events record wall-clock time as epoch milliseconds plus the
//! sub-millisecond remainder in nanoseconds, so they can be rendered at
//! millisecond precision by default and at microsecond precision on request.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::time::SystemTime;

/// The instant an event was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogTimestamp {
    epoch_millis: i64,
    nano_of_millisecond: u32,
}

impl LogTimestamp {
    pub fn now() -> Self {
        Self::from_datetime(&Utc::now())
    }

    /// Build a timestamp; `nano_of_millisecond` is clamped below one millisecond.
    pub fn new(epoch_millis: i64, nano_of_millisecond: u32) -> Self {
        Self {
            epoch_millis,
            nano_of_millisecond: nano_of_millisecond.min(999_999),
        }
    }

    pub fn from_datetime(datetime: &DateTime<Utc>) -> Self {
        Self::new(
            datetime.timestamp_millis(),
            datetime.timestamp_subsec_nanos() % 1_000_000,
        )
    }

    pub fn epoch_millis(&self) -> i64 {
        self.epoch_millis
    }

    pub fn nano_of_millisecond(&self) -> u32 {
        self.nano_of_millisecond
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        let base = Utc
            .timestamp_millis_opt(self.epoch_millis)
            .single()
            .unwrap_or_default();
        base + chrono::Duration::nanoseconds(i64::from(self.nano_of_millisecond))
    }
}

impl From<SystemTime> for LogTimestamp {
    fn from(value: SystemTime) -> Self {
        let datetime: DateTime<Utc> = value.into();
        Self::from_datetime(&datetime)
    }
}

impl fmt::Display for LogTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&TimestampFormat::Iso8601.format(self))
    }
}

/// Standardized timestamp format options
///
/// # Examples
///
/// ```
/// use rust_log_router::core::{LogTimestamp, TimestampFormat};
///
/// let ts = LogTimestamp::new(1_736_332_245_123, 0);
/// assert_eq!(TimestampFormat::Iso8601.format(&ts), "2025-01-08T10:30:45.123Z");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    /// Parse the option of a `%d{...}` pattern converter.
    ///
    /// Accepts the names `ISO8601`, `ISO8601_MICROS` and `UNIX_MILLIS`;
    /// anything else is taken as a strftime pattern.
    pub fn from_option(option: &str) -> Self {
        match option.trim() {
            "" | "ISO8601" => TimestampFormat::Iso8601,
            "ISO8601_MICROS" => TimestampFormat::Iso8601Micros,
            "UNIX_MILLIS" => TimestampFormat::UnixMillis,
            other => TimestampFormat::Custom(other.to_string()),
        }
    }

    #[must_use]
    pub fn format(&self, timestamp: &LogTimestamp) -> String {
        let datetime = timestamp.to_datetime();
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            TimestampFormat::UnixMillis => timestamp.epoch_millis().to_string(),
            TimestampFormat::Custom(format_str) => {
                // Invalid strftime items surface as a fmt error rather than a panic
                let mut out = String::new();
                match write!(out, "{}", datetime.format(format_str)) {
                    Ok(()) => out,
                    Err(_) => format_str.clone(),
                }
            }
        }
    }
}
