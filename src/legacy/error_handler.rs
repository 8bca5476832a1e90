//! Error handlers of the older model

use super::event::LoggingEvent;
use crate::core::{StatusLogger, Thrown};
use std::sync::atomic::{AtomicBool, Ordering};

pub const GENERIC_FAILURE: i32 = 0;
pub const WRITE_FAILURE: i32 = 1;
pub const FLUSH_FAILURE: i32 = 2;
pub const CLOSE_FAILURE: i32 = 3;
pub const FILE_OPEN_FAILURE: i32 = 4;
pub const MISSING_LAYOUT: i32 = 5;
pub const ADDRESS_PARSE_FAILURE: i32 = 6;

pub trait ErrorHandler: Send + Sync {
    fn error(&self, message: &str);

    /// Full report with an optional exception, one of the failure codes
    /// above and the event being appended.
    fn error_with(
        &self,
        message: &str,
        exception: Option<&Thrown>,
        error_code: i32,
        event: Option<&dyn LoggingEvent>,
    );
}

/// Reports the first error and silently drops the rest.
#[derive(Debug)]
pub struct OnlyOnceErrorHandler {
    first_time: AtomicBool,
}

impl OnlyOnceErrorHandler {
    pub fn new() -> Self {
        Self {
            first_time: AtomicBool::new(true),
        }
    }

    /// True until the first error has been reported.
    pub fn is_pristine(&self) -> bool {
        self.first_time.load(Ordering::Acquire)
    }

    fn claim(&self) -> bool {
        self.first_time
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for OnlyOnceErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorHandler for OnlyOnceErrorHandler {
    fn error(&self, message: &str) {
        if self.claim() {
            StatusLogger::global().error(message);
        }
    }

    fn error_with(
        &self,
        message: &str,
        exception: Option<&Thrown>,
        _error_code: i32,
        _event: Option<&dyn LoggingEvent>,
    ) {
        if self.claim() {
            let cause = exception.map(|thrown| thrown.stack_trace_lines().join("\n"));
            StatusLogger::global().log(crate::core::LogLevel::Error, message, cause);
        }
    }
}
