//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// No plugin registered under the requested type name
    #[error("No plugin registered for type '{0}'")]
    UnknownPlugin(String),

    /// A named appender reference could not be resolved
    #[error("No appender named '{0}' in configuration")]
    UnknownAppender(String),

    /// Building the appender for a route key failed
    #[error("Unable to create appender for route '{key}': {message}")]
    Construction { key: String, message: String },

    /// No route could be selected for an event
    #[error("No route available for key '{key}'")]
    NoRoute { key: String },

    /// A route script failed or returned an unusable value
    #[error("Script '{script}' failed: {message}")]
    Script { script: String, message: String },

    /// The appender was used before `start()` or after `stop()`
    #[error("Appender '{0}' is not started")]
    NotStarted(String),

    /// Appender already stopped
    #[error("Appender '{0}' already stopped")]
    Stopped(String),

    /// A bridged component lacks the requested capability
    #[error("{component} does not support {capability}")]
    Unsupported {
        component: String,
        capability: String,
    },

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an appender construction error for a route key
    pub fn construction(key: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Construction {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a script evaluation error
    pub fn script(script: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Script {
            script: script.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported capability error
    pub fn unsupported(component: impl Into<String>, capability: impl Into<String>) -> Self {
        LoggerError::Unsupported {
            component: component.into(),
            capability: capability.into(),
        }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
