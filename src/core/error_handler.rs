//! Error handlers receiving failures raised while appending

use super::log_entry::LogEvent;
use super::status::StatusLogger;
use super::thrown::Thrown;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Receives errors an appender could not deliver to the application.
pub trait ErrorHandler: Send + Sync {
    fn error(&self, message: &str);

    fn error_with_thrown(&self, message: &str, thrown: &Thrown);

    fn error_with_event(&self, message: &str, event: &dyn LogEvent, thrown: Option<&Thrown>);
}

/// Errors always reported before rate limiting starts.
pub const MAX_REPORTED_EXCEPTIONS: u64 = 3;

/// Minimum spacing between reports once the limit is reached.
pub const EXCEPTION_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Reports appender errors to the status logger.
///
/// The first few errors are always reported; after that at most one report
/// per [`EXCEPTION_INTERVAL`] gets through so a broken appender cannot flood
/// the status output.
#[derive(Debug)]
pub struct DefaultErrorHandler {
    appender_name: String,
    exception_count: AtomicU64,
    last_report: Mutex<Option<Instant>>,
    interval: Duration,
}

impl DefaultErrorHandler {
    pub fn new(appender_name: impl Into<String>) -> Self {
        Self::with_interval(appender_name, EXCEPTION_INTERVAL)
    }

    pub fn with_interval(appender_name: impl Into<String>, interval: Duration) -> Self {
        Self {
            appender_name: appender_name.into(),
            exception_count: AtomicU64::new(0),
            last_report: Mutex::new(None),
            interval,
        }
    }

    /// Total errors received, reported or not.
    pub fn exception_count(&self) -> u64 {
        self.exception_count.load(Ordering::Relaxed)
    }

    fn should_report(&self) -> bool {
        let count = self.exception_count.fetch_add(1, Ordering::Relaxed) + 1;
        let now = Instant::now();
        let mut last = self.last_report.lock();
        let due = match *last {
            Some(at) => now.duration_since(at) >= self.interval,
            None => true,
        };
        if count <= MAX_REPORTED_EXCEPTIONS || due {
            *last = Some(now);
            true
        } else {
            false
        }
    }

    fn report(&self, message: &str, thrown: Option<&Thrown>) {
        if !self.should_report() {
            return;
        }
        let message = format!("Appender '{}': {}", self.appender_name, message);
        let cause = thrown.map(|t| t.stack_trace_lines().join("\n"));
        StatusLogger::global().log(super::LogLevel::Error, message, cause);
    }
}

impl ErrorHandler for DefaultErrorHandler {
    fn error(&self, message: &str) {
        self.report(message, None);
    }

    fn error_with_thrown(&self, message: &str, thrown: &Thrown) {
        self.report(message, Some(thrown));
    }

    fn error_with_event(&self, message: &str, _event: &dyn LogEvent, thrown: Option<&Thrown>) {
        self.report(message, thrown);
    }
}
