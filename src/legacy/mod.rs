//! The older event model
//!
//! Integer levels, linked filter chains, appenders that report failures to an
//! error handler instead of returning them. The [`crate::bridge`] module
//! converts between this model and [`crate::core`].

pub mod appender;
pub mod error_handler;
pub mod event;
pub mod filter;
pub mod layout;
pub mod level;
pub mod rewrite;

pub use appender::{Appender, AppenderSkeleton, VectorAppender};
pub use error_handler::{ErrorHandler, OnlyOnceErrorHandler};
pub use event::{LegacyEvent, LocationInfo, LoggingEvent};
pub use filter::{
    chain_nodes, decide_chain, Decision, DenyAllFilter, Filter, FilterChain, LevelMatchFilter,
    LevelRangeFilter, StringMatchFilter,
};
pub use layout::{Layout, SimpleLayout};
pub use level::Level;
pub use rewrite::{PropertyRewritePolicy, RewritePolicy};
