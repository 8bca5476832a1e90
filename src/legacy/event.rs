//! Events of the older model

use super::level::Level;
use crate::core::log_entry::current_thread_name;
use crate::core::{ContextMap, LogEvent, ThreadContext, Thrown};
use chrono::Utc;
use std::fmt;

/// Placeholder for unavailable location fields.
pub const NA: &str = "?";

/// Caller location as the older model reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationInfo {
    pub class_name: String,
    pub method_name: String,
    pub file_name: String,
    pub line_number: String,
}

impl LocationInfo {
    pub fn new(
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        file_name: impl Into<String>,
        line_number: impl Into<String>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            file_name: file_name.into(),
            line_number: line_number.into(),
        }
    }

    pub fn unavailable() -> Self {
        Self::new(NA, NA, NA, NA)
    }

    /// `class.method(file:line)`
    pub fn full_info(&self) -> String {
        format!(
            "{}.{}({}:{})",
            self.class_name, self.method_name, self.file_name, self.line_number
        )
    }
}

/// Read access to an older-model event.
pub trait LoggingEvent: Send + Sync + fmt::Debug {
    fn logger_name(&self) -> &str;

    fn level(&self) -> &Level;

    fn rendered_message(&self) -> &str;

    /// The nested diagnostic context as one space-separated string.
    fn ndc(&self) -> Option<&str>;

    fn properties(&self) -> &ContextMap;

    fn mdc(&self, key: &str) -> Option<&str> {
        self.properties().get(key).map(String::as_str)
    }

    fn thread_name(&self) -> &str;

    fn time_stamp(&self) -> i64;

    fn thrown(&self) -> Option<&Thrown>;

    fn throwable_str_rep(&self) -> Option<&[String]> {
        self.thrown().map(Thrown::stack_trace_lines)
    }

    fn location_information(&self) -> Option<&LocationInfo>;

    /// The newer-model event this value is a view over, if any.
    fn modern_view(&self) -> Option<&dyn LogEvent> {
        None
    }
}

/// Concrete older-model event.
#[derive(Debug, Clone)]
pub struct LegacyEvent {
    logger_name: String,
    level: Level,
    message: String,
    ndc: Option<String>,
    properties: ContextMap,
    thread_name: String,
    time_stamp: i64,
    thrown: Option<Thrown>,
    location: Option<LocationInfo>,
}

impl LegacyEvent {
    /// Create an event on the current thread, copying its diagnostic context.
    pub fn new(logger_name: impl Into<String>, level: Level, message: impl Into<String>) -> Self {
        let stack = ThreadContext::stack_snapshot();
        Self {
            logger_name: logger_name.into(),
            level,
            message: message.into(),
            ndc: (!stack.is_empty()).then(|| stack.join(" ")),
            properties: ThreadContext::map_snapshot(),
            thread_name: current_thread_name().unwrap_or_else(|| {
                crate::core::log_entry::current_thread_id()
            }),
            time_stamp: Utc::now().timestamp_millis(),
            thrown: None,
            location: None,
        }
    }

    pub fn copy_from(event: &dyn LoggingEvent) -> Self {
        Self {
            logger_name: event.logger_name().to_string(),
            level: event.level().clone(),
            message: event.rendered_message().to_string(),
            ndc: event.ndc().map(String::from),
            properties: event.properties().clone(),
            thread_name: event.thread_name().to_string(),
            time_stamp: event.time_stamp(),
            thrown: event.thrown().cloned(),
            location: event.location_information().cloned(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_ndc(mut self, ndc: impl Into<String>) -> Self {
        self.ndc = Some(ndc.into());
        self
    }

    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    #[must_use]
    pub fn with_time_stamp(mut self, millis: i64) -> Self {
        self.time_stamp = millis;
        self
    }

    #[must_use]
    pub fn with_thrown(mut self, thrown: Thrown) -> Self {
        self.thrown = Some(thrown);
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: LocationInfo) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl LoggingEvent for LegacyEvent {
    fn logger_name(&self) -> &str {
        &self.logger_name
    }

    fn level(&self) -> &Level {
        &self.level
    }

    fn rendered_message(&self) -> &str {
        &self.message
    }

    fn ndc(&self) -> Option<&str> {
        self.ndc.as_deref()
    }

    fn properties(&self) -> &ContextMap {
        &self.properties
    }

    fn thread_name(&self) -> &str {
        &self.thread_name
    }

    fn time_stamp(&self) -> i64 {
        self.time_stamp
    }

    fn thrown(&self) -> Option<&Thrown> {
        self.thrown.as_ref()
    }

    fn location_information(&self) -> Option<&LocationInfo> {
        self.location.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_captures_thread_context() {
        let _guard = ThreadContext::scoped("user", "carol");
        let _frame = ThreadContext::push_scoped("checkout");
        let event = LegacyEvent::new("shop", Level::INFO, "paid");

        assert_eq!(event.mdc("user"), Some("carol"));
        assert_eq!(event.ndc(), Some("checkout"));
        assert!(event.time_stamp() > 0);
    }

    #[test]
    fn test_throwable_rep_comes_from_thrown() {
        let event = LegacyEvent::new("shop", Level::ERROR, "failed")
            .with_thrown(Thrown::exception("PaymentError", "declined"));
        assert_eq!(
            event.throwable_str_rep().map(|lines| lines[0].as_str()),
            Some("PaymentError: declined")
        );
    }

    #[test]
    fn test_location_full_info() {
        let location = LocationInfo::new("Shop", "pay", "Shop.java", "88");
        assert_eq!(location.full_info(), "Shop.pay(Shop.java:88)");
        assert_eq!(LocationInfo::unavailable().line_number, NA);
    }
}
