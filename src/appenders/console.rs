//! Console appender implementation

use crate::core::{
    Appender, FilterSet, Filterable, Layout, LifeCycle, LogEvent, LogLevel, LoggerError,
    PatternLayout, Result,
};
#[cfg(feature = "console")]
use colored::Colorize;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

/// Where console output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleTarget {
    SystemOut,
    SystemErr,
    /// Error and Fatal to stderr, everything else to stdout
    #[default]
    Split,
}

impl FromStr for ConsoleTarget {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SYSTEM_OUT" | "STDOUT" => Ok(ConsoleTarget::SystemOut),
            "SYSTEM_ERR" | "STDERR" => Ok(ConsoleTarget::SystemErr),
            "SPLIT" => Ok(ConsoleTarget::Split),
            _ => Err(format!("Invalid console target: '{}'", s)),
        }
    }
}

pub struct ConsoleAppender {
    name: String,
    use_colors: bool,
    target: ConsoleTarget,
    layout: Arc<dyn Layout>,
    filters: FilterSet,
    life_cycle: LifeCycle,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self {
            name: "console".to_string(),
            use_colors: cfg!(feature = "console"),
            target: ConsoleTarget::default(),
            layout: Arc::new(PatternLayout::default()),
            filters: FilterSet::new(),
            life_cycle: LifeCycle::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: ConsoleTarget) -> Self {
        self.target = target;
        self
    }

    /// Set the layout for this appender
    ///
    /// # Example
    ///
    /// ```
    /// use rust_log_router::appenders::ConsoleAppender;
    /// use rust_log_router::core::JsonLayout;
    /// use std::sync::Arc;
    ///
    /// let appender = ConsoleAppender::new()
    ///     .with_layout(Arc::new(JsonLayout::new().with_compact(true)));
    /// ```
    #[must_use]
    pub fn with_layout(mut self, layout: Arc<dyn Layout>) -> Self {
        self.layout = layout;
        self
    }

    fn goes_to_stderr(&self, level: LogLevel) -> bool {
        match self.target {
            ConsoleTarget::SystemOut => false,
            ConsoleTarget::SystemErr => true,
            ConsoleTarget::Split => level.is_more_specific_than(LogLevel::Error),
        }
    }

    #[cfg(feature = "console")]
    fn colorize(&self, level: LogLevel, output: String) -> String {
        if !self.use_colors {
            return output;
        }
        let (line, newline) = match output.strip_suffix('\n') {
            Some(line) => (line, "\n"),
            None => (output.as_str(), ""),
        };
        format!("{}{}", line.color(level.color_code()), newline)
    }

    #[cfg(not(feature = "console"))]
    fn colorize(&self, _level: LogLevel, output: String) -> String {
        output
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&self, event: &dyn LogEvent) -> Result<()> {
        if self.filters.is_filtered(event) {
            return Ok(());
        }
        let output = self.colorize(event.level(), self.layout.format(event));

        let written = if self.goes_to_stderr(event.level()) {
            std::io::stderr().lock().write_all(output.as_bytes())
        } else {
            std::io::stdout().lock().write_all(output.as_bytes())
        };
        written.map_err(|e| LoggerError::io_operation("writing to console", e.to_string(), e))
    }

    fn flush(&self) -> Result<()> {
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) {
        self.life_cycle.start();
    }

    fn stop(&self) {
        if self.life_cycle.stop() {
            let _ = self.flush();
        }
    }

    fn is_started(&self) -> bool {
        self.life_cycle.is_started()
    }

    fn filterable(&self) -> Option<&dyn Filterable> {
        Some(&self.filters)
    }

    fn layout(&self) -> Option<Arc<dyn Layout>> {
        Some(Arc::clone(&self.layout))
    }
}
