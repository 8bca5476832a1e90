//! Levels of the older event model

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

/// A severity on the older integer scale, where a larger value is more severe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Level {
    value: i32,
    name: Cow<'static, str>,
    syslog_equivalent: i32,
}

impl Level {
    pub const OFF_INT: i32 = i32::MAX;
    pub const FATAL_INT: i32 = 50_000;
    pub const ERROR_INT: i32 = 40_000;
    pub const WARN_INT: i32 = 30_000;
    pub const INFO_INT: i32 = 20_000;
    pub const DEBUG_INT: i32 = 10_000;
    pub const TRACE_INT: i32 = 5_000;
    pub const ALL_INT: i32 = i32::MIN;

    pub const OFF: Level = Level::constant(Self::OFF_INT, "OFF", 0);
    pub const FATAL: Level = Level::constant(Self::FATAL_INT, "FATAL", 0);
    pub const ERROR: Level = Level::constant(Self::ERROR_INT, "ERROR", 3);
    pub const WARN: Level = Level::constant(Self::WARN_INT, "WARN", 4);
    pub const INFO: Level = Level::constant(Self::INFO_INT, "INFO", 6);
    pub const DEBUG: Level = Level::constant(Self::DEBUG_INT, "DEBUG", 7);
    pub const TRACE: Level = Level::constant(Self::TRACE_INT, "TRACE", 7);
    pub const ALL: Level = Level::constant(Self::ALL_INT, "ALL", 7);

    const fn constant(value: i32, name: &'static str, syslog_equivalent: i32) -> Self {
        Self {
            value,
            name: Cow::Borrowed(name),
            syslog_equivalent,
        }
    }

    /// The standard levels, most severe first.
    pub fn standard() -> [Level; 8] {
        [
            Level::OFF,
            Level::FATAL,
            Level::ERROR,
            Level::WARN,
            Level::INFO,
            Level::DEBUG,
            Level::TRACE,
            Level::ALL,
        ]
    }

    /// A custom level.
    pub fn new(value: i32, name: impl Into<Cow<'static, str>>, syslog_equivalent: i32) -> Self {
        Self {
            value,
            name: name.into(),
            syslog_equivalent,
        }
    }

    pub fn to_int(&self) -> i32 {
        self.value
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn syslog_equivalent(&self) -> i32 {
        self.syslog_equivalent
    }

    pub fn is_greater_or_equal(&self, other: &Level) -> bool {
        self.value >= other.value
    }

    pub fn is_standard(&self) -> bool {
        Self::standard()
            .iter()
            .any(|level| level.value == self.value && level.name == self.name)
    }

    /// The standard level with this name, ignoring case, or `default`.
    pub fn to_level(name: &str, default: Level) -> Level {
        let upper = name.trim().to_uppercase();
        Self::standard()
            .into_iter()
            .find(|level| level.name == upper.as_str())
            .unwrap_or(default)
    }

    /// The standard level with exactly this value, or `default`.
    pub fn from_int(value: i32, default: Level) -> Level {
        Self::standard()
            .into_iter()
            .find(|level| level.value == value)
            .unwrap_or(default)
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .cmp(&other.value)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
