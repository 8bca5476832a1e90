//! Level translation between the two models
//!
//! Both models share the ordinal table `TRACE < DEBUG < INFO < WARN < ERROR <
//! FATAL` plus the `ALL`/`OFF` sentinels. Standard levels translate by name;
//! custom levels translate to the standard level whose integer value is
//! nearest on their own scale. Anything that cannot be placed maps to `ERROR`.

use crate::core::LogLevel;
use crate::legacy::Level;

/// Standard levels of both models, paired by ordinal.
const ORDINALS: [(LogLevel, Level); 8] = [
    (LogLevel::Off, Level::OFF),
    (LogLevel::Fatal, Level::FATAL),
    (LogLevel::Error, Level::ERROR),
    (LogLevel::Warn, Level::WARN),
    (LogLevel::Info, Level::INFO),
    (LogLevel::Debug, Level::DEBUG),
    (LogLevel::Trace, Level::TRACE),
    (LogLevel::All, Level::ALL),
];

/// Range of the table considered when placing custom levels; the sentinels
/// are only ever matched exactly.
const PLACEABLE: std::ops::Range<usize> = 1..7;

#[derive(Debug, Clone, Copy, Default)]
pub struct LevelMapping;

impl LevelMapping {
    pub fn to_legacy(level: LogLevel) -> Level {
        if let Some((_, legacy)) = ORDINALS.iter().find(|(modern, _)| {
            modern.to_str().eq_ignore_ascii_case(level.to_str())
        }) {
            return legacy.clone();
        }
        let target = i64::from(level.int_level());
        ORDINALS[PLACEABLE]
            .iter()
            .min_by_key(|(modern, _)| (i64::from(modern.int_level()) - target).abs())
            .map(|(_, legacy)| legacy.clone())
            .unwrap_or(Level::ERROR)
    }

    pub fn to_modern(level: &Level) -> LogLevel {
        if let Some((modern, _)) = ORDINALS
            .iter()
            .find(|(_, legacy)| legacy.name().eq_ignore_ascii_case(level.name()))
        {
            return *modern;
        }
        if let Some((modern, _)) = ORDINALS
            .iter()
            .find(|(_, legacy)| legacy.to_int() == level.to_int())
        {
            return *modern;
        }
        let target = i64::from(level.to_int());
        ORDINALS[PLACEABLE]
            .iter()
            .min_by_key(|(_, legacy)| (i64::from(legacy.to_int()) - target).abs())
            .map(|(modern, _)| *modern)
            .unwrap_or(LogLevel::Error)
    }
}
