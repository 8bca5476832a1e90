//! Layouts turning events into text
//!
//! Provides the [`Layout`] contract plus two implementations:
//! - `PatternLayout`: conversion-pattern text (`%d [%t] %-5p %c - %m%n`)
//! - `JsonLayout`: one JSON object per event

use super::error::{LoggerError, Result};
use super::log_entry::LogEvent;
use super::timestamp::TimestampFormat;
use crate::legacy;
use std::sync::Arc;

pub trait Layout: Send + Sync {
    fn format(&self, event: &dyn LogEvent) -> String;

    /// Encoded form of `format`.
    fn to_byte_array(&self, event: &dyn LogEvent) -> Vec<u8> {
        self.format(event).into_bytes()
    }

    fn header(&self) -> Option<Vec<u8>> {
        None
    }

    fn footer(&self) -> Option<Vec<u8>> {
        None
    }

    fn content_type(&self) -> &str {
        "text/plain; charset=UTF-8"
    }

    /// The older-model layout this value wraps, if any.
    fn legacy_view(&self) -> Option<Arc<dyn legacy::Layout>> {
        None
    }
}

pub const DEFAULT_CONVERSION_PATTERN: &str = "%d [%t] %-5p %c - %m%n";

#[derive(Debug, Clone, PartialEq)]
enum Converter {
    Date(TimestampFormat),
    Level,
    Logger,
    Thread,
    Message,
    Newline,
    ContextMap(Option<String>),
    ContextStack,
    Method,
    Line,
    File,
    Throwable,
    Marker,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Convert {
        converter: Converter,
        min_width: usize,
        left_align: bool,
    },
}

/// Text layout driven by a conversion pattern
///
/// Supported conversions: `%d{fmt}`, `%p`/`%level`, `%c`/`%logger`,
/// `%t`/`%thread`, `%m`/`%msg`, `%n`, `%X{key}` (or `%X` for the whole
/// context map), `%x`, `%M`, `%L`, `%F`, `%ex`, `%marker` and `%%`. A
/// conversion may carry a minimum width, left aligned when prefixed with `-`.
///
/// # Example
///
/// ```
/// use rust_log_router::core::{Layout, LogEntry, LogLevel, PatternLayout};
///
/// let layout = PatternLayout::new("%-5p %c: %m").unwrap();
/// let event = LogEntry::new(LogLevel::Warn, "disk low").with_logger_name("app");
/// assert_eq!(layout.format(&event), "WARN  app: disk low");
/// ```
#[derive(Debug, Clone)]
pub struct PatternLayout {
    pattern: String,
    segments: Vec<Segment>,
    always_write_exceptions: bool,
    header: Option<String>,
    footer: Option<String>,
}

impl PatternLayout {
    pub fn new(pattern: &str) -> Result<Self> {
        let segments = Self::parse(pattern)?;
        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            always_write_exceptions: true,
            header: None,
            footer: None,
        })
    }

    /// Append the stack trace of thrown errors even when the pattern lacks `%ex`.
    #[must_use]
    pub fn with_always_write_exceptions(mut self, enabled: bool) -> Self {
        self.always_write_exceptions = enabled;
        self
    }

    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    #[must_use]
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn parse(pattern: &str) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                literal.push('%');
                continue;
            }

            let left_align = chars.next_if_eq(&'-').is_some();
            let mut width = String::new();
            while let Some(d) = chars.next_if(|c| c.is_ascii_digit()) {
                width.push(d);
            }
            let mut name = String::new();
            while let Some(a) = chars.next_if(|c| c.is_ascii_alphabetic()) {
                name.push(a);
            }
            let option = if chars.next_if_eq(&'{').is_some() {
                let mut option = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => option.push(ch),
                        None => {
                            return Err(LoggerError::formatter(
                                "pattern",
                                format!("unterminated option in '{}'", pattern),
                            ))
                        }
                    }
                }
                Some(option)
            } else {
                None
            };

            let converter = match name.as_str() {
                "d" | "date" => Converter::Date(TimestampFormat::from_option(
                    option.as_deref().unwrap_or_default(),
                )),
                "p" | "level" => Converter::Level,
                "c" | "logger" => Converter::Logger,
                "t" | "thread" => Converter::Thread,
                "m" | "msg" | "message" => Converter::Message,
                "n" => Converter::Newline,
                "X" | "mdc" => Converter::ContextMap(option),
                "x" | "NDC" => Converter::ContextStack,
                "M" | "method" => Converter::Method,
                "L" | "line" => Converter::Line,
                "F" | "file" => Converter::File,
                "ex" | "throwable" => Converter::Throwable,
                "marker" => Converter::Marker,
                "" => {
                    return Err(LoggerError::formatter(
                        "pattern",
                        format!("dangling '%' in '{}'", pattern),
                    ))
                }
                other => {
                    return Err(LoggerError::formatter(
                        "pattern",
                        format!("unknown conversion '%{}'", other),
                    ))
                }
            };

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Convert {
                converter,
                min_width: width.parse().unwrap_or(0),
                left_align,
            });
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(segments)
    }

    fn convert(converter: &Converter, event: &dyn LogEvent, out: &mut String) {
        match converter {
            Converter::Date(format) => out.push_str(&format.format(&event.timestamp())),
            Converter::Level => out.push_str(event.level().to_str()),
            Converter::Logger => out.push_str(event.logger_name()),
            Converter::Thread => out.push_str(event.thread_name().unwrap_or(event.thread_id())),
            Converter::Message => out.push_str(event.message()),
            Converter::Newline => out.push('\n'),
            Converter::ContextMap(Some(key)) => {
                if let Some(value) = event.context_map().get(key) {
                    out.push_str(value);
                }
            }
            Converter::ContextMap(None) => {
                let fields: Vec<String> = event
                    .context_map()
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect();
                out.push('{');
                out.push_str(&fields.join(", "));
                out.push('}');
            }
            Converter::ContextStack => out.push_str(&event.context_stack().join(" ")),
            Converter::Method => {
                if let Some(function) = event.source().and_then(|s| s.function.as_deref()) {
                    out.push_str(function);
                }
            }
            Converter::Line => {
                if let Some(line) = event.source().and_then(|s| s.line) {
                    out.push_str(&line.to_string());
                }
            }
            Converter::File => {
                if let Some(file) = event.source().and_then(|s| s.file.as_deref()) {
                    out.push_str(file);
                }
            }
            Converter::Throwable => {
                if let Some(thrown) = event.thrown() {
                    for line in thrown.stack_trace_lines() {
                        out.push_str(line);
                        out.push('\n');
                    }
                }
            }
            Converter::Marker => {
                if let Some(marker) = event.marker() {
                    out.push_str(&marker.to_string());
                }
            }
        }
    }
}

impl Default for PatternLayout {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_CONVERSION_PATTERN.to_string(),
            segments: Self::parse(DEFAULT_CONVERSION_PATTERN).unwrap_or_default(),
            always_write_exceptions: true,
            header: None,
            footer: None,
        }
    }
}

impl Layout for PatternLayout {
    fn format(&self, event: &dyn LogEvent) -> String {
        let mut out = String::with_capacity(128);
        let mut wrote_thrown = false;

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Convert {
                    converter,
                    min_width,
                    left_align,
                } => {
                    wrote_thrown |= *converter == Converter::Throwable;
                    let start = out.len();
                    Self::convert(converter, event, &mut out);
                    let written = out[start..].chars().count();
                    if written < *min_width {
                        let padding = " ".repeat(min_width - written);
                        if *left_align {
                            out.push_str(&padding);
                        } else {
                            out.insert_str(start, &padding);
                        }
                    }
                }
            }
        }

        if self.always_write_exceptions && !wrote_thrown {
            if let Some(thrown) = event.thrown() {
                for line in thrown.stack_trace_lines() {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        out
    }

    fn header(&self) -> Option<Vec<u8>> {
        self.header.as_ref().map(|h| h.as_bytes().to_vec())
    }

    fn footer(&self) -> Option<Vec<u8>> {
        self.footer.as_ref().map(|f| f.as_bytes().to_vec())
    }
}

/// One JSON object per event.
#[derive(Debug, Clone)]
pub struct JsonLayout {
    timestamp_format: TimestampFormat,
    compact: bool,
    event_eol: bool,
}

impl JsonLayout {
    pub fn new() -> Self {
        Self {
            timestamp_format: TimestampFormat::default(),
            compact: true,
            event_eol: true,
        }
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Pretty-print instead of one line per event.
    #[must_use]
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    #[must_use]
    pub fn with_event_eol(mut self, event_eol: bool) -> Self {
        self.event_eol = event_eol;
        self
    }

    pub fn to_value(&self, event: &dyn LogEvent) -> serde_json::Value {
        use serde_json::{json, Map, Value};

        let mut obj = Map::new();
        obj.insert(
            "timestamp".to_string(),
            match self.timestamp_format {
                TimestampFormat::UnixMillis => json!(event.timestamp().epoch_millis()),
                _ => Value::String(self.timestamp_format.format(&event.timestamp())),
            },
        );
        obj.insert("level".to_string(), json!(event.level().to_str()));
        obj.insert("loggerName".to_string(), json!(event.logger_name()));
        obj.insert("message".to_string(), json!(event.message()));
        obj.insert("threadId".to_string(), json!(event.thread_id()));
        if let Some(name) = event.thread_name() {
            obj.insert("thread".to_string(), json!(name));
        }
        if let Some(marker) = event.marker() {
            obj.insert("marker".to_string(), json!(marker.to_string()));
        }
        if !event.context_map().is_empty() {
            obj.insert("contextMap".to_string(), json!(event.context_map()));
        }
        if !event.context_stack().is_empty() {
            obj.insert("contextStack".to_string(), json!(event.context_stack()));
        }
        if let Some(source) = event.source() {
            obj.insert("source".to_string(), json!(source));
        }
        if let Some(thrown) = event.thrown() {
            obj.insert(
                "thrown".to_string(),
                json!({
                    "name": thrown.class_name(),
                    "message": thrown.message(),
                    "stackTrace": thrown.stack_trace_lines(),
                }),
            );
        }
        Value::Object(obj)
    }
}

impl Default for JsonLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl Layout for JsonLayout {
    fn format(&self, event: &dyn LogEvent) -> String {
        let value = self.to_value(event);
        let mut text = if self.compact {
            serde_json::to_string(&value).unwrap_or_default()
        } else {
            serde_json::to_string_pretty(&value).unwrap_or_default()
        };
        if self.event_eol {
            text.push('\n');
        }
        text
    }

    fn content_type(&self) -> &str {
        "application/json; charset=UTF-8"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogEntry, LogLevel, LogTimestamp, Marker, SourceLocation, Thrown};

    fn event() -> LogEntry {
        LogEntry::new(LogLevel::Error, "Error occurred")
            .with_logger_name("app.db")
            .with_timestamp(LogTimestamp::new(1_736_332_245_123, 0))
            .with_thread(Some("worker-1".into()), "ThreadId(7)")
            .with_context_entry("request_id", "abc-123")
            .with_context_stack(vec!["outer".into(), "inner".into()])
    }

    #[test]
    fn test_default_pattern() {
        let out = PatternLayout::default().format(&event());
        assert_eq!(out, "2025-01-08T10:30:45.123Z [worker-1] ERROR app.db - Error occurred\n");
    }

    #[test]
    fn test_context_conversions_and_padding() {
        let layout = PatternLayout::new("[%5p] %X{request_id} %x %X %%").unwrap();
        let out = layout.format(&event());
        assert_eq!(out, "[ERROR] abc-123 outer inner {request_id=abc-123} %");

        let layout = PatternLayout::new("%-6p|%6c").unwrap();
        let info = LogEntry::new(LogLevel::Info, "x").with_logger_name("a");
        assert_eq!(layout.format(&info), "INFO  |     a");
    }

    #[test]
    fn test_location_and_marker() {
        let layout = PatternLayout::new("%F:%L %M %marker").unwrap();
        let e = event()
            .with_location(SourceLocation::new("app::db", "db.rs", 12).with_function("query"))
            .with_marker(Marker::new("SQL"));
        assert_eq!(layout.format(&e), "db.rs:12 query SQL");
    }

    #[test]
    fn test_exceptions_written_when_missing_from_pattern() {
        let layout = PatternLayout::new("%m%n").unwrap();
        let e = event().with_thrown(Thrown::exception("Timeout", "after 5s"));
        assert_eq!(layout.format(&e), "Error occurred\nTimeout: after 5s\n");

        let quiet = layout.with_always_write_exceptions(false);
        assert_eq!(quiet.format(&e), "Error occurred\n");
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(PatternLayout::new("%q").is_err());
        assert!(PatternLayout::new("%d{yyyy").is_err());
        assert!(PatternLayout::new("trailing %").is_err());
    }

    #[test]
    fn test_json_layout() {
        let layout = JsonLayout::new();
        let out = layout.format(&event());
        assert!(out.ends_with('\n'));

        let parsed: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(parsed["level"], "ERROR");
        assert_eq!(parsed["message"], "Error occurred");
        assert_eq!(parsed["contextMap"]["request_id"], "abc-123");
        assert_eq!(parsed["contextStack"][1], "inner");
        assert_eq!(layout.content_type(), "application/json; charset=UTF-8");
    }

    #[test]
    fn test_json_numeric_timestamp() {
        let layout = JsonLayout::new().with_timestamp_format(TimestampFormat::UnixMillis);
        let parsed = layout.to_value(&event());
        assert_eq!(parsed["timestamp"], 1_736_332_245_123i64);
    }
}
