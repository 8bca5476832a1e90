//! Logger facade creating events and handing them to appenders

use super::{
    appender::Appender,
    error::Result,
    log_entry::{LogEntry, LogEvent, Message},
    log_level::LogLevel,
    status::StatusLogger,
    thrown::Thrown,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A named logger appending synchronously on the calling thread.
///
/// Events below the minimum level are discarded before an entry is built.
/// Each appender runs inside its own `catch_unwind`, so one failing or
/// panicking appender neither reaches the caller nor starves the others.
pub struct Logger {
    name: String,
    min_level: RwLock<LogLevel>,
    appenders: RwLock<Vec<Arc<dyn Appender>>>,
    logged: AtomicU64,
    dropped: AtomicU64,
}

impl Logger {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_level: RwLock::new(LogLevel::Info),
            appenders: RwLock::new(Vec::new()),
            logged: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rust_log_router::prelude::*;
    /// use std::sync::Arc;
    ///
    /// let list = Arc::new(ListAppender::new("list"));
    /// let logger = Logger::builder("app")
    ///     .min_level(LogLevel::Debug)
    ///     .shared_appender(list.clone())
    ///     .build();
    ///
    /// logger.debug("connected");
    /// assert_eq!(list.messages(), vec!["connected".to_string()]);
    /// ```
    #[must_use]
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_appender(&self, appender: Arc<dyn Appender>) {
        self.appenders.write().push(appender);
    }

    pub fn set_min_level(&self, level: LogLevel) {
        *self.min_level.write() = level;
    }

    pub fn min_level(&self) -> LogLevel {
        *self.min_level.read()
    }

    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= *self.min_level.read()
    }

    pub fn log(&self, level: LogLevel, message: impl Into<Message>) {
        if !self.is_enabled(level) {
            return;
        }
        let entry = LogEntry::new(level, message).with_logger_name(self.name.clone());
        self.dispatch(&entry);
    }

    pub fn log_thrown(&self, level: LogLevel, message: impl Into<Message>, thrown: Thrown) {
        if !self.is_enabled(level) {
            return;
        }
        let entry = LogEntry::new(level, message)
            .with_logger_name(self.name.clone())
            .with_thrown(thrown);
        self.dispatch(&entry);
    }

    /// Append a prepared entry, still subject to the minimum level.
    pub fn log_entry(&self, entry: &LogEntry) {
        if self.is_enabled(entry.level()) {
            self.dispatch(entry);
        }
    }

    #[inline]
    pub fn trace(&self, message: impl Into<Message>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<Message>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<Message>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<Message>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<Message>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<Message>) {
        self.log(LogLevel::Fatal, message);
    }

    fn dispatch(&self, entry: &LogEntry) {
        let appenders = self.appenders.read();
        let mut has_error = false;

        for appender in appenders.iter() {
            let append_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                appender.append(entry)
            }));

            match append_result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    StatusLogger::global().error_with_cause(
                        format!("Appender '{}' failed", appender.name()),
                        &e,
                    );
                    has_error = true;
                }
                Err(panic_info) => {
                    let thrown = Thrown::from_panic(panic_info.as_ref());
                    StatusLogger::global().error(format!(
                        "Appender '{}' panicked: {}. Other appenders continue to function.",
                        appender.name(),
                        thrown.message().unwrap_or("Unknown panic")
                    ));
                    has_error = true;
                }
            }
        }

        if has_error {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        } else {
            self.logged.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Events delivered to every appender.
    pub fn logged_count(&self) -> u64 {
        self.logged.load(Ordering::Relaxed)
    }

    /// Events at least one appender failed on.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn flush(&self) -> Result<()> {
        for appender in self.appenders.read().iter() {
            appender.flush()?;
        }
        Ok(())
    }

    /// Stop every appender and detach them from this logger.
    pub fn shutdown(&self) {
        let appenders = std::mem::take(&mut *self.appenders.write());
        for appender in appenders {
            if let Err(e) = appender.flush() {
                StatusLogger::global()
                    .error_with_cause(format!("Failed to flush '{}' during shutdown", appender.name()), &e);
            }
            appender.stop();
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            StatusLogger::global().error_with_cause("Failed to flush during drop", &e);
        }
    }
}

/// Builder for constructing Logger with a fluent API
pub struct LoggerBuilder {
    name: String,
    min_level: LogLevel,
    appenders: Vec<Arc<dyn Appender>>,
}

impl LoggerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_level: LogLevel::Info,
            appenders: Vec::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Add an appender, starting it when the logger is built
    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Arc::new(appender));
        self
    }

    /// Add an appender that is also referenced elsewhere
    #[must_use = "builder methods return a new value"]
    pub fn shared_appender(mut self, appender: Arc<dyn Appender>) -> Self {
        self.appenders.push(appender);
        self
    }

    pub fn build(self) -> Logger {
        let logger = Logger::new(self.name);
        logger.set_min_level(self.min_level);
        for appender in self.appenders {
            if !appender.is_started() {
                appender.start();
            }
            logger.add_appender(appender);
        }
        logger
    }
}
