//! Errors captured on events

use once_cell::sync::OnceCell;
use std::any::Any;
use std::fmt;

/// What kind of failure a [`Thrown`] represents.
///
/// `Exception` is an ordinary recoverable error. `Error` covers failures the
/// application was not expected to handle, such as a caught panic; the older
/// error-handler contract can only carry exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrownKind {
    Exception,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub module: String,
    pub function: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.module, self.function)?;
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{}", file, line)?,
            (Some(file), None) => f.write_str(file)?,
            _ => f.write_str("Unknown Source")?,
        }
        f.write_str(")")
    }
}

/// An error attached to an event, with an optional cause chain.
///
/// The rendered stack trace lines are computed once on first use.
#[derive(Debug, Clone)]
pub struct Thrown {
    class_name: String,
    message: Option<String>,
    kind: ThrownKind,
    frames: Vec<StackFrame>,
    cause: Option<Box<Thrown>>,
    rendered: OnceCell<Vec<String>>,
}

impl Thrown {
    pub fn new(class_name: impl Into<String>, message: Option<String>, kind: ThrownKind) -> Self {
        Self {
            class_name: class_name.into(),
            message,
            kind,
            frames: Vec::new(),
            cause: None,
            rendered: OnceCell::new(),
        }
    }

    pub fn exception(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(class_name, Some(message.into()), ThrownKind::Exception)
    }

    pub fn error(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(class_name, Some(message.into()), ThrownKind::Error)
    }

    /// Capture an error value and its `source()` chain.
    pub fn from_error<E: std::error::Error + 'static>(error: &E) -> Self {
        let mut thrown = Self::exception(std::any::type_name::<E>(), error.to_string());
        thrown.cause = error.source().map(|src| Box::new(Self::from_source(src)));
        thrown
    }

    fn from_source(error: &(dyn std::error::Error + 'static)) -> Self {
        let debug = format!("{:?}", error);
        let class_name: String = debug
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == ':')
            .collect();
        let mut thrown = Self::exception(
            if class_name.is_empty() { "Error".to_string() } else { class_name },
            error.to_string(),
        );
        thrown.cause = error.source().map(|src| Box::new(Self::from_source(src)));
        thrown
    }

    /// Capture the payload of a caught panic.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        Self::error("panic", message)
    }

    #[must_use]
    pub fn with_frame(mut self, frame: StackFrame) -> Self {
        self.frames.push(frame);
        self.rendered = OnceCell::new();
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: Thrown) -> Self {
        self.cause = Some(Box::new(cause));
        self.rendered = OnceCell::new();
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn kind(&self) -> ThrownKind {
        self.kind
    }

    pub fn is_exception(&self) -> bool {
        self.kind == ThrownKind::Exception
    }

    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    pub fn cause(&self) -> Option<&Thrown> {
        self.cause.as_deref()
    }

    /// The stack trace as display lines, `Caused by:` sections included.
    pub fn stack_trace_lines(&self) -> &[String] {
        self.rendered.get_or_init(|| {
            let mut lines = Vec::new();
            self.render_into(&mut lines, "");
            lines
        })
    }

    fn render_into(&self, lines: &mut Vec<String>, prefix: &str) {
        lines.push(format!("{}{}", prefix, self));
        for frame in &self.frames {
            lines.push(format!("\tat {}", frame));
        }
        if let Some(cause) = &self.cause {
            cause.render_into(lines, "Caused by: ");
        }
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.class_name, message),
            None => f.write_str(&self.class_name),
        }
    }
}
