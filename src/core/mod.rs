//! Core logger types and traits

pub mod appender;
pub mod error;
pub mod error_handler;
pub mod filter;
pub mod layout;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod marker;
pub mod rewrite;
pub mod status;
pub mod thrown;
pub mod timestamp;

pub use appender::{Appender, FilterSet, Filterable, LifeCycle, LifeCycleState};
pub use error::{LoggerError, Result};
pub use error_handler::{DefaultErrorHandler, ErrorHandler};
pub use filter::{CompositeFilter, Filter, FilterResult, MarkerFilter, ThresholdFilter};
pub use layout::{JsonLayout, Layout, PatternLayout, DEFAULT_CONVERSION_PATTERN};
pub use log_context::{ContextGuard, ContextMap, StackGuard, ThreadContext};
pub use log_entry::{LogEntry, LogEvent, Message, SourceLocation};
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use marker::Marker;
pub use rewrite::{MapRewriteMode, MapRewritePolicy, RewritePolicy};
pub use status::{ListenerId, StatusData, StatusListener, StatusLogger};
pub use thrown::{StackFrame, Thrown, ThrownKind};
pub use timestamp::{LogTimestamp, TimestampFormat};
