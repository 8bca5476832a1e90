//! Adapters between the older and the newer event model
//!
//! Every extensible component kind has a pair: `XAdapter` presents an
//! older-model component through the newer trait, `XWrapper` does the
//! reverse. The `adapt`/`wrap` constructors unwrap instead of stacking, so
//! adapting a wrapper (or wrapping an adapter) returns the original value.

pub mod appender;
pub mod error_handler;
pub mod event;
pub mod filter;
pub mod layout;
pub mod level;
pub mod rewrite;

pub use appender::{AppenderAdapter, AppenderWrapper};
pub use error_handler::ErrorHandlerAdapter;
pub use event::{resolve_thread_id, EventAdapter, EventWrapper, LegacyEventView, ModernEventView};
pub use filter::{FilterAdapter, FilterWrapper};
pub use layout::{LayoutAdapter, LayoutWrapper};
pub use level::LevelMapping;
pub use rewrite::{RewritePolicyAdapter, RewritePolicyWrapper};
