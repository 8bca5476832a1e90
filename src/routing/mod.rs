//! Routing engine
//!
//! [`RoutingAppender`] resolves a key for each event, looks up or lazily
//! builds the appender serving that key in an [`AppenderRegistry`], and lets
//! a [`PurgePolicy`] evict appenders that are no longer used.

pub mod appender;
pub mod control;
pub mod metrics;
pub mod purge;
pub mod registry;
pub mod resolver;
pub mod route;

pub use appender::{RoutingAppender, RoutingAppenderBuilder, DEFAULT_KEY};
pub use control::{AppendOutcome, AppenderControl};
pub use metrics::RoutingMetrics;
pub use purge::{IdlePurgePolicy, ManualPurgePolicy, PurgePolicy, TimeUnit};
pub use registry::{AppenderRegistry, FORWARD_ATTEMPTS};
pub use resolver::{evaluate_script, FnScript, RouteResolver, RouteScript, ScriptBindings, StaticVariables};
pub use route::{Route, RouteTarget, Routes};
