//! Layouts of the older model

use super::event::LoggingEvent;
use std::sync::Arc;

pub const LINE_SEP: &str = "\n";

pub trait Layout: Send + Sync {
    fn format(&self, event: &dyn LoggingEvent) -> String;

    fn content_type(&self) -> &str {
        "text/plain"
    }

    fn header(&self) -> Option<String> {
        None
    }

    fn footer(&self) -> Option<String> {
        None
    }

    /// True when the layout leaves the throwable for the appender to print.
    fn ignores_throwable(&self) -> bool {
        true
    }

    /// The newer-model layout this value wraps, if any.
    fn modern_view(&self) -> Option<Arc<dyn crate::core::Layout>> {
        None
    }
}

/// `LEVEL - message`
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleLayout;

impl Layout for SimpleLayout {
    fn format(&self, event: &dyn LoggingEvent) -> String {
        format!("{} - {}{}", event.level(), event.rendered_message(), LINE_SEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::{LegacyEvent, Level};

    #[test]
    fn test_simple_layout() {
        let event = LegacyEvent::new("app", Level::WARN, "disk almost full");
        assert_eq!(SimpleLayout.format(&event), "WARN - disk almost full\n");
        assert!(SimpleLayout.ignores_throwable());
    }
}
