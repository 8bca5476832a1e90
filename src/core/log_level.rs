//! Log level definitions

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Severity of an event in the newer event model.
///
/// Every level carries an integer on the standard scale where a smaller
/// number is more severe (`OFF = 0`, `FATAL = 100`, ..., `TRACE = 600`,
/// `ALL = u32::MAX`). Ordering follows severity, so `Trace < Info < Fatal`
/// and the `All`/`Off` sentinels sit at the two ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogLevel {
    Off,
    Fatal,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
    All,
    /// An application defined level positioned anywhere on the integer scale
    Custom { name: &'static str, int_level: u32 },
}

impl LogLevel {
    /// The standard levels, most severe first.
    pub const STANDARD: [LogLevel; 8] = [
        LogLevel::Off,
        LogLevel::Fatal,
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
        LogLevel::All,
    ];

    /// Returns the standard level with this name, or a custom level.
    pub fn for_name(name: &'static str, int_level: u32) -> Self {
        name.parse()
            .unwrap_or(LogLevel::Custom { name, int_level })
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "OFF",
            LogLevel::Fatal => "FATAL",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
            LogLevel::All => "ALL",
            LogLevel::Custom { name, .. } => name,
        }
    }

    pub fn int_level(&self) -> u32 {
        match self {
            LogLevel::Off => 0,
            LogLevel::Fatal => 100,
            LogLevel::Error => 200,
            LogLevel::Warn => 300,
            LogLevel::Info => 400,
            LogLevel::Debug => 500,
            LogLevel::Trace => 600,
            LogLevel::All => u32::MAX,
            LogLevel::Custom { int_level, .. } => *int_level,
        }
    }

    pub fn is_standard(&self) -> bool {
        !matches!(self, LogLevel::Custom { .. })
    }

    /// True when this level is at least as severe as `other`.
    pub fn is_more_specific_than(&self, other: LogLevel) -> bool {
        self.int_level() <= other.int_level()
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self.int_level() {
            0..=100 => BrightRed,
            101..=200 => Red,
            201..=300 => Yellow,
            301..=400 => Green,
            401..=500 => Blue,
            _ => BrightBlack,
        }
    }
}

impl PartialOrd for LogLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .int_level()
            .cmp(&self.int_level())
            .then_with(|| self.to_str().cmp(other.to_str()))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OFF" => Ok(LogLevel::Off),
            "FATAL" => Ok(LogLevel::Fatal),
            "ERROR" => Ok(LogLevel::Error),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "INFO" => Ok(LogLevel::Info),
            "DEBUG" => Ok(LogLevel::Debug),
            "TRACE" => Ok(LogLevel::Trace),
            "ALL" => Ok(LogLevel::All),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}
