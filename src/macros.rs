//! Logging macros for ergonomic log message formatting.
//!
//! These macros format their arguments like `format!` and hand the result to
//! a [`Logger`](crate::core::Logger). An optional `{ key => value, ... }`
//! block puts entries into the [`ThreadContext`](crate::core::ThreadContext)
//! for the duration of the call, which is how events pick up the context
//! values a routing pattern such as `${ctx:type}` resolves against.
//!
//! # Examples
//!
//! ```
//! use rust_log_router::prelude::*;
//! use rust_log_router::info;
//! use std::sync::Arc;
//!
//! let list = Arc::new(ListAppender::new("list"));
//! let logger = Logger::builder("app").shared_appender(list.clone()).build();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, { "type" => "Service" }, "Server listening on port {}", port);
//!
//! let events = list.events();
//! assert_eq!(events[1].message(), "Server listening on port 8080");
//! assert_eq!(events[1].context_map().get("type").map(String::as_str), Some("Service"));
//! assert!(ThreadContext::get("type").is_none());
//! ```

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use rust_log_router::prelude::*;
/// # let logger = Logger::new("app");
/// use rust_log_router::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// log!(logger, LogLevel::Warn, { "type" => "Alert" }, "Disk {}% full", 91);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, { $($key:expr => $value:expr),+ $(,)? }, $($arg:tt)+) => {{
        let _context = [$($crate::core::ThreadContext::scoped($key, $value)),+];
        $logger.log($level, format!($($arg)+))
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_router::prelude::*;
/// # let logger = Logger::new("app");
/// use rust_log_router::info;
/// info!(logger, "Application started");
/// info!(logger, { "tenant" => "acme" }, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Fatal, $($arg)+)
    };
}
