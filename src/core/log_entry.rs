//! The event abstraction of the newer model and its concrete value type

use super::log_context::{ContextMap, ThreadContext};
use super::log_level::LogLevel;
use super::marker::Marker;
use super::thrown::Thrown;
use super::timestamp::LogTimestamp;
use crate::legacy::LoggingEvent;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

/// Get cached thread ID, computing and caching it on first access
pub(crate) fn current_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

/// Get cached thread name, computing and caching it on first access
pub(crate) fn current_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// Where in the application an event was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub module_path: String,
    pub function: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl SourceLocation {
    pub fn new(module_path: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            module_path: module_path.into(),
            function: None,
            file: Some(file.into()),
            line: Some(line),
        }
    }

    #[must_use]
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }
}

/// The message payload of an event.
///
/// Parameterized messages substitute `{}` placeholders in order; the
/// result is rendered lazily by the owning event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Simple(String),
    Parameterized { pattern: String, params: Vec<String> },
}

impl Message {
    pub fn parameterized(pattern: impl Into<String>, params: Vec<String>) -> Self {
        Message::Parameterized {
            pattern: pattern.into(),
            params,
        }
    }

    /// The unformatted text: the pattern for parameterized messages.
    pub fn pattern(&self) -> &str {
        match self {
            Message::Simple(text) => text,
            Message::Parameterized { pattern, .. } => pattern,
        }
    }

    fn render(&self) -> String {
        match self {
            Message::Simple(text) => text.clone(),
            Message::Parameterized { pattern, params } => {
                let mut out = String::with_capacity(pattern.len() + params.len() * 8);
                let mut params = params.iter();
                let mut rest = pattern.as_str();
                while let Some(pos) = rest.find("{}") {
                    out.push_str(&rest[..pos]);
                    match params.next() {
                        Some(param) => out.push_str(param),
                        None => out.push_str("{}"),
                    }
                    rest = &rest[pos + 2..];
                }
                out.push_str(rest);
                out
            }
        }
    }
}

impl From<String> for Message {
    fn from(value: String) -> Self {
        Message::Simple(value)
    }
}

impl From<&str> for Message {
    fn from(value: &str) -> Self {
        Message::Simple(value.to_string())
    }
}

/// Read access to a log event.
///
/// Appenders, filters, layouts and policies all receive events through this
/// trait, so views over events of the older model can be passed anywhere a
/// [`LogEntry`] can.
pub trait LogEvent: Send + Sync + fmt::Debug {
    fn logger_name(&self) -> &str;

    fn level(&self) -> LogLevel;

    /// The fully formatted message.
    fn message(&self) -> &str;

    fn timestamp(&self) -> LogTimestamp;

    fn thread_name(&self) -> Option<&str>;

    fn thread_id(&self) -> &str;

    fn context_map(&self) -> &ContextMap;

    fn context_stack(&self) -> &[String];

    fn thrown(&self) -> Option<&Thrown>;

    fn source(&self) -> Option<&SourceLocation>;

    fn marker(&self) -> Option<&Marker>;

    /// The older-model event this value is a view over, if any.
    fn legacy_view(&self) -> Option<&dyn LoggingEvent> {
        None
    }
}

/// An immutable event.
///
/// Identity fields are fixed at construction; the formatted message is
/// computed on first access and cached.
#[derive(Debug, Clone)]
pub struct LogEntry {
    logger_name: String,
    level: LogLevel,
    message: Message,
    formatted: OnceCell<String>,
    timestamp: LogTimestamp,
    thread_name: Option<String>,
    thread_id: String,
    context_map: ContextMap,
    context_stack: Vec<String>,
    thrown: Option<Thrown>,
    source: Option<SourceLocation>,
    marker: Option<Marker>,
}

impl LogEntry {
    /// Create an event on the current thread, snapshotting its context.
    pub fn new(level: LogLevel, message: impl Into<Message>) -> Self {
        Self {
            logger_name: String::new(),
            level,
            message: message.into(),
            formatted: OnceCell::new(),
            timestamp: LogTimestamp::now(),
            thread_name: current_thread_name(),
            thread_id: current_thread_id(),
            context_map: ThreadContext::map_snapshot(),
            context_stack: ThreadContext::stack_snapshot(),
            thrown: None,
            source: None,
            marker: None,
        }
    }

    /// Copy every field of another event into a new owned entry.
    pub fn copy_from(event: &dyn LogEvent) -> Self {
        Self {
            logger_name: event.logger_name().to_string(),
            level: event.level(),
            message: Message::Simple(event.message().to_string()),
            formatted: OnceCell::new(),
            timestamp: event.timestamp(),
            thread_name: event.thread_name().map(String::from),
            thread_id: event.thread_id().to_string(),
            context_map: event.context_map().clone(),
            context_stack: event.context_stack().to_vec(),
            thrown: event.thrown().cloned(),
            source: event.source().cloned(),
            marker: event.marker().cloned(),
        }
    }

    #[must_use]
    pub fn with_logger_name(mut self, name: impl Into<String>) -> Self {
        self.logger_name = name.into();
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.source = Some(location);
        self
    }

    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }

    #[must_use]
    pub fn with_thrown(mut self, thrown: Thrown) -> Self {
        self.thrown = Some(thrown);
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: LogTimestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_thread(mut self, name: Option<String>, id: impl Into<String>) -> Self {
        self.thread_name = name;
        self.thread_id = id.into();
        self
    }

    #[must_use]
    pub fn with_context_map(mut self, map: ContextMap) -> Self {
        self.context_map = map;
        self
    }

    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_map.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_context_stack(mut self, stack: Vec<String>) -> Self {
        self.context_stack = stack;
        self
    }

    pub fn raw_message(&self) -> &Message {
        &self.message
    }
}

impl LogEvent for LogEntry {
    fn logger_name(&self) -> &str {
        &self.logger_name
    }

    fn level(&self) -> LogLevel {
        self.level
    }

    fn message(&self) -> &str {
        self.formatted.get_or_init(|| self.message.render())
    }

    fn timestamp(&self) -> LogTimestamp {
        self.timestamp
    }

    fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
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
        self.thrown.as_ref()
    }

    fn source(&self) -> Option<&SourceLocation> {
        self.source.as_ref()
    }

    fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }
}
