//! Internal diagnostics for the logging framework itself
//!
//! Failures inside appenders, resolvers and bridges must never unwind into
//! the application, so they end up here instead. Records are kept in a
//! bounded buffer, handed to registered listeners and echoed to stderr when
//! they reach the console threshold.

use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Environment variable selecting the stderr threshold (default `ERROR`).
pub const STATUS_LEVEL_ENV: &str = "LOG_ROUTER_STATUS_LEVEL";

/// Number of records retained for inspection.
pub const DEFAULT_STATUS_CAPACITY: usize = 1000;

/// One internal diagnostic record
#[derive(Debug, Clone)]
pub struct StatusData {
    pub level: LogLevel,
    pub message: String,
    pub cause: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub thread_name: Option<String>,
}

impl StatusData {
    fn prefix(&self) -> &'static str {
        match self.level.int_level() {
            0..=200 => "[LOGGER ERROR]",
            201..=300 => "[LOGGER WARNING]",
            _ => "[LOGGER]",
        }
    }
}

/// Receives every status record at or above its own level.
pub trait StatusListener: Send + Sync {
    fn level(&self) -> LogLevel {
        LogLevel::Trace
    }

    fn log(&self, data: &StatusData);
}

/// Handle returned by [`StatusLogger::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

/// Process-wide sink for the framework's own warnings and errors.
///
/// # Example
///
/// ```
/// use rust_log_router::core::StatusLogger;
///
/// StatusLogger::global().warn("route 'x' has no appender");
/// assert!(!StatusLogger::global().entries_matching("route 'x'").is_empty());
/// ```
pub struct StatusLogger {
    buffer: RwLock<VecDeque<StatusData>>,
    capacity: usize,
    console_level: RwLock<LogLevel>,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn StatusListener>)>>,
    next_listener: AtomicU64,
}

static GLOBAL: Lazy<StatusLogger> = Lazy::new(|| {
    let level = std::env::var(STATUS_LEVEL_ENV)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(LogLevel::Error);
    StatusLogger::new(DEFAULT_STATUS_CAPACITY, level)
});

impl StatusLogger {
    pub fn new(capacity: usize, console_level: LogLevel) -> Self {
        Self {
            buffer: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
            console_level: RwLock::new(console_level),
            listeners: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(0),
        }
    }

    pub fn global() -> &'static StatusLogger {
        &GLOBAL
    }

    pub fn set_console_level(&self, level: LogLevel) {
        *self.console_level.write() = level;
    }

    pub fn console_level(&self) -> LogLevel {
        *self.console_level.read()
    }

    pub fn add_listener(&self, listener: Arc<dyn StatusListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) {
        self.listeners.write().retain(|(existing, _)| *existing != id);
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>, cause: Option<String>) {
        let data = StatusData {
            level,
            message: message.into(),
            cause,
            timestamp: Utc::now(),
            thread_name: std::thread::current().name().map(String::from),
        };

        if level >= self.console_level() {
            match &data.cause {
                Some(cause) => eprintln!("{} {}: {}", data.prefix(), data.message, cause),
                None => eprintln!("{} {}", data.prefix(), data.message),
            }
        }

        for (_, listener) in self.listeners.read().iter() {
            if level >= listener.level() {
                listener.log(&data);
            }
        }

        let mut buffer = self.buffer.write();
        if buffer.len() >= self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(data);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message, None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message, None);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message, None);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message, None);
    }

    pub fn warn_with_cause(&self, message: impl Into<String>, cause: &dyn std::error::Error) {
        self.log(LogLevel::Warn, message, Some(cause.to_string()));
    }

    pub fn error_with_cause(&self, message: impl Into<String>, cause: &dyn std::error::Error) {
        self.log(LogLevel::Error, message, Some(cause.to_string()));
    }

    /// Snapshot of the retained records, oldest first.
    pub fn entries(&self) -> Vec<StatusData> {
        self.buffer.read().iter().cloned().collect()
    }

    /// Retained records whose message or cause contains `needle`.
    pub fn entries_matching(&self, needle: &str) -> Vec<StatusData> {
        self.buffer
            .read()
            .iter()
            .filter(|data| {
                data.message.contains(needle)
                    || data.cause.as_deref().is_some_and(|cause| cause.contains(needle))
            })
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.buffer.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Counting {
        seen: AtomicUsize,
    }

    impl StatusListener for Counting {
        fn level(&self) -> LogLevel {
            LogLevel::Warn
        }

        fn log(&self, _data: &StatusData) {
            self.seen.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_buffer_is_bounded() {
        let status = StatusLogger::new(3, LogLevel::Off);
        for i in 0..5 {
            status.info(format!("message {}", i));
        }
        let entries = status.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "message 2");
    }

    #[test]
    fn test_listener_threshold_and_removal() {
        let status = StatusLogger::new(10, LogLevel::Off);
        let listener = Arc::new(Counting {
            seen: AtomicUsize::new(0),
        });
        let id = status.add_listener(listener.clone());

        status.debug("ignored");
        status.warn("counted");
        status.error("counted too");
        assert_eq!(listener.seen.load(Ordering::Relaxed), 2);

        status.remove_listener(id);
        status.error("after removal");
        assert_eq!(listener.seen.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_entries_matching_searches_cause() {
        let status = StatusLogger::new(10, LogLevel::Off);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        status.error_with_cause("append failed", &io);
        assert_eq!(status.entries_matching("disk on fire").len(), 1);
        assert!(status.entries_matching("nothing").is_empty());
    }
}
