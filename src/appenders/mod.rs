//! Appender implementations

pub mod console;
pub mod file;
pub mod list;

pub use console::{ConsoleAppender, ConsoleTarget};
pub use file::FileAppender;
pub use list::ListAppender;

pub use crate::core::Appender;
