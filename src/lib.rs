//! # Rust Log Router
//!
//! A routing appender that dispatches log events to appenders chosen per
//! event, plus a bridge letting components of an older logging model work
//! wherever the newer one is expected.
//!
//! ## Features
//!
//! - **Dynamic routing**: route keys from `${...}` patterns or scripts, with
//!   route appenders built lazily from configuration templates
//! - **Purge policies**: idle appenders are evicted by a background sweep or
//!   on demand, each stopped exactly once
//! - **Two event models**: adapters for events, filters, layouts, appenders,
//!   error handlers and rewrite policies in both directions
//! - **Never throws at the caller**: failures end up in the status logger
//!
//! ## Example
//!
//! ```
//! use rust_log_router::prelude::*;
//! use std::sync::Arc;
//!
//! let alerts = Arc::new(ListAppender::new("alerts"));
//! let routing = RoutingAppender::builder("routing")
//!     .pattern("${ctx:type}")
//!     .route(Route::reference(alerts.clone()).with_key("Alert"))
//!     .route(Route::definition(Node::new("List").with_attribute("name", "${ctx:type}")))
//!     .build()
//!     .unwrap();
//!
//! let logger = Logger::builder("app").appender(routing).build();
//! {
//!     let _type = ThreadContext::scoped("type", "Alert");
//!     logger.error("disk full");
//! }
//! assert_eq!(alerts.messages(), vec!["disk full".to_string()]);
//! logger.shutdown();
//! ```

pub mod appenders;
pub mod bridge;
pub mod config;
pub mod core;
pub mod legacy;
pub mod macros;
pub mod routing;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, FileAppender, ListAppender};
    pub use crate::config::{Configuration, Node};
    pub use crate::core::{
        Appender, ContextGuard, Filter, FilterResult, Layout, LogEntry, LogEvent, LogLevel, Logger,
        LoggerBuilder, LoggerError, Marker, PatternLayout, Result, StatusLogger, ThreadContext,
    };
    pub use crate::routing::{
        FnScript, IdlePurgePolicy, ManualPurgePolicy, PurgePolicy, Route, RoutingAppender,
        ScriptBindings,
    };
}

pub use appenders::{ConsoleAppender, FileAppender, ListAppender};
pub use core::{Appender, LogEntry, LogEvent, LogLevel, Logger, LoggerBuilder, LoggerError, Result};
pub use routing::{Route, RoutingAppender};
