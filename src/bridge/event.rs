//! Event views across the two models
//!
//! [`EventAdapter`] presents a newer-model event through the older
//! [`LoggingEvent`] trait, [`EventWrapper`] does the reverse. Both borrow the
//! event they view and copy its context data when they are built, so a view
//! keeps describing the event even if the thread that produced it moves on.
//!
//! [`LegacyEventView::of`] and [`ModernEventView::of`] take the identity fast
//! path: viewing a view in its own source model yields the original event.

use super::level::LevelMapping;
use crate::core::log_entry::{current_thread_id, current_thread_name};
use crate::core::{
    ContextMap, LogEvent, LogLevel, LogTimestamp, Marker, SourceLocation, Thrown,
};
use crate::legacy::event::NA;
use crate::legacy::{Level, LocationInfo, LoggingEvent};
use std::ops::Deref;

/// Best-effort id lookup for a captured thread name: only the current
/// thread can be identified.
pub fn resolve_thread_id(thread_name: &str) -> Option<String> {
    if thread_name.is_empty() {
        return None;
    }
    match current_thread_name() {
        Some(current) if current == thread_name => Some(current_thread_id()),
        _ => None,
    }
}

/// A newer-model event viewed as an older-model one.
#[derive(Debug)]
pub struct EventAdapter<'a> {
    event: &'a dyn LogEvent,
    level: Level,
    ndc: Option<String>,
    properties: ContextMap,
    thread_name: String,
    location: Option<LocationInfo>,
}

impl<'a> EventAdapter<'a> {
    pub fn new(event: &'a dyn LogEvent) -> Self {
        let stack = event.context_stack();
        Self {
            event,
            level: LevelMapping::to_legacy(event.level()),
            ndc: (!stack.is_empty()).then(|| stack.join(" ")),
            properties: event.context_map().clone(),
            thread_name: event
                .thread_name()
                .unwrap_or_else(|| event.thread_id())
                .to_string(),
            location: event.source().map(|source| {
                LocationInfo::new(
                    source.module_path.clone(),
                    source.function.clone().unwrap_or_else(|| NA.to_string()),
                    source.file.clone().unwrap_or_else(|| NA.to_string()),
                    source
                        .line
                        .map(|line| line.to_string())
                        .unwrap_or_else(|| NA.to_string()),
                )
            }),
        }
    }

    /// The viewed event.
    pub fn event(&self) -> &'a dyn LogEvent {
        self.event
    }
}

impl LoggingEvent for EventAdapter<'_> {
    fn logger_name(&self) -> &str {
        self.event.logger_name()
    }

    fn level(&self) -> &Level {
        &self.level
    }

    fn rendered_message(&self) -> &str {
        self.event.message()
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
        self.event.timestamp().epoch_millis()
    }

    fn thrown(&self) -> Option<&Thrown> {
        self.event.thrown()
    }

    fn location_information(&self) -> Option<&LocationInfo> {
        self.location.as_ref()
    }

    fn modern_view(&self) -> Option<&dyn LogEvent> {
        Some(self.event)
    }
}

/// An older-model event viewed as a newer-model one.
#[derive(Debug)]
pub struct EventWrapper<'a> {
    event: &'a dyn LoggingEvent,
    level: LogLevel,
    context_map: ContextMap,
    context_stack: Vec<String>,
    thread_id: String,
    source: Option<SourceLocation>,
}

impl<'a> EventWrapper<'a> {
    pub fn new(event: &'a dyn LoggingEvent) -> Self {
        let context_stack = event
            .ndc()
            .map(|ndc| ndc.split_whitespace().map(String::from).collect())
            .unwrap_or_default();
        Self {
            event,
            level: LevelMapping::to_modern(event.level()),
            context_map: event.properties().clone(),
            context_stack,
            thread_id: resolve_thread_id(event.thread_name()).unwrap_or_default(),
            source: event.location_information().map(|location| SourceLocation {
                module_path: location.class_name.clone(),
                function: (location.method_name != NA).then(|| location.method_name.clone()),
                file: (location.file_name != NA).then(|| location.file_name.clone()),
                line: location.line_number.parse().ok(),
            }),
        }
    }

    /// The viewed event.
    pub fn event(&self) -> &'a dyn LoggingEvent {
        self.event
    }
}

impl LogEvent for EventWrapper<'_> {
    fn logger_name(&self) -> &str {
        self.event.logger_name()
    }

    fn level(&self) -> LogLevel {
        self.level
    }

    fn message(&self) -> &str {
        self.event.rendered_message()
    }

    fn timestamp(&self) -> LogTimestamp {
        LogTimestamp::new(self.event.time_stamp(), 0)
    }

    fn thread_name(&self) -> Option<&str> {
        Some(self.event.thread_name()).filter(|name| !name.is_empty())
    }

    fn thread_id(&self) -> &str {
        &self.thread_id
    }

    fn context_map(&self) -> &ContextMap {
        &self.context_map
    }

    fn context_stack(&self) -> &[String] {
        &self.context_stack
    }

    fn thrown(&self) -> Option<&Thrown> {
        self.event.thrown()
    }

    fn source(&self) -> Option<&SourceLocation> {
        self.source.as_ref()
    }

    fn marker(&self) -> Option<&Marker> {
        None
    }

    fn legacy_view(&self) -> Option<&dyn LoggingEvent> {
        Some(self.event)
    }
}

/// A newer-model event as seen by older-model components.
pub enum LegacyEventView<'a> {
    Original(&'a dyn LoggingEvent),
    Adapted(EventAdapter<'a>),
}

impl<'a> LegacyEventView<'a> {
    pub fn of(event: &'a dyn LogEvent) -> Self {
        match event.legacy_view() {
            Some(original) => LegacyEventView::Original(original),
            None => LegacyEventView::Adapted(EventAdapter::new(event)),
        }
    }
}

impl<'a> Deref for LegacyEventView<'a> {
    type Target = dyn LoggingEvent + 'a;

    fn deref(&self) -> &Self::Target {
        match self {
            LegacyEventView::Original(event) => *event,
            LegacyEventView::Adapted(adapter) => adapter,
        }
    }
}

/// An older-model event as seen by newer-model components.
pub enum ModernEventView<'a> {
    Original(&'a dyn LogEvent),
    Wrapped(EventWrapper<'a>),
}

impl<'a> ModernEventView<'a> {
    pub fn of(event: &'a dyn LoggingEvent) -> Self {
        match event.modern_view() {
            Some(original) => ModernEventView::Original(original),
            None => ModernEventView::Wrapped(EventWrapper::new(event)),
        }
    }
}

impl<'a> Deref for ModernEventView<'a> {
    type Target = dyn LogEvent + 'a;

    fn deref(&self) -> &Self::Target {
        match self {
            ModernEventView::Original(event) => *event,
            ModernEventView::Wrapped(wrapper) => wrapper,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogEntry, ThreadContext};
    use crate::legacy::LegacyEvent;

    fn same_address<A: ?Sized, B: ?Sized>(a: &A, b: &B) -> bool {
        std::ptr::eq(a as *const A as *const u8, b as *const B as *const u8)
    }

    #[test]
    fn test_adapter_delegates_fields() {
        let entry = LogEntry::new(LogLevel::Warn, "low disk")
            .with_logger_name("storage")
            .with_context_entry("volume", "sda1")
            .with_context_stack(vec!["job".into(), "cleanup".into()])
            .with_location(SourceLocation::new("storage::gc", "gc.rs", 42).with_function("sweep"));
        let adapter = EventAdapter::new(&entry);

        assert_eq!(adapter.logger_name(), "storage");
        assert_eq!(adapter.level(), &Level::WARN);
        assert_eq!(adapter.rendered_message(), "low disk");
        assert_eq!(adapter.mdc("volume"), Some("sda1"));
        assert_eq!(adapter.ndc(), Some("job cleanup"));
        assert_eq!(adapter.time_stamp(), entry.timestamp().epoch_millis());
        let location = adapter.location_information().expect("location");
        assert_eq!(location.full_info(), "storage::gc.sweep(gc.rs:42)");
    }

    #[test]
    fn test_wrapper_delegates_fields() {
        let legacy = LegacyEvent::new("billing", Level::ERROR, "charge failed")
            .with_property("order", "17")
            .with_ndc("batch nightly")
            .with_time_stamp(1_736_332_245_123)
            .with_location(LocationInfo::new("Billing", "charge", NA, "12"));
        let wrapper = EventWrapper::new(&legacy);

        assert_eq!(wrapper.level(), LogLevel::Error);
        assert_eq!(wrapper.message(), "charge failed");
        assert_eq!(wrapper.context_map().get("order").map(String::as_str), Some("17"));
        assert_eq!(wrapper.context_stack(), ["batch", "nightly"]);
        assert_eq!(wrapper.timestamp().epoch_millis(), 1_736_332_245_123);
        let source = wrapper.source().expect("source");
        assert_eq!(source.function.as_deref(), Some("charge"));
        assert_eq!(source.file, None);
        assert_eq!(source.line, Some(12));
    }

    #[test]
    fn test_context_is_copied_at_construction() {
        let _guard = ThreadContext::scoped("request", "r-1");
        let legacy = LegacyEvent::new("web", Level::INFO, "served");
        let wrapper = EventWrapper::new(&legacy);
        drop(_guard);
        assert_eq!(
            wrapper.context_map().get("request").map(String::as_str),
            Some("r-1")
        );
    }

    #[test]
    fn test_round_trip_returns_original() {
        let entry = LogEntry::new(LogLevel::Info, "hello");
        let adapter = EventAdapter::new(&entry);
        let back = ModernEventView::of(&adapter);
        assert!(matches!(back, ModernEventView::Original(_)));
        assert!(same_address(&*back, &entry));

        let legacy = LegacyEvent::new("x", Level::INFO, "hello");
        let wrapper = EventWrapper::new(&legacy);
        let back = LegacyEventView::of(&wrapper);
        assert!(matches!(back, LegacyEventView::Original(_)));
        assert!(same_address(&*back, &legacy));
    }

    #[test]
    fn test_thread_identity_is_best_effort() {
        let here = LegacyEvent::new("x", Level::INFO, "local");
        let wrapper = EventWrapper::new(&here);
        if current_thread_name().is_some() {
            assert_eq!(wrapper.thread_id(), current_thread_id());
        }

        let elsewhere = here.clone().with_thread_name("some-other-thread");
        assert_eq!(EventWrapper::new(&elsewhere).thread_id(), "");
    }
}
