//! Route key resolution
//!
//! A key is produced either by expanding a pattern against the event or by
//! evaluating a script. Scripts are supplied by the application as
//! [`RouteScript`] values; the routing appender owns the map of static
//! variables they share across invocations.

use crate::config::StrSubstitutor;
use crate::core::{ContextMap, LogEvent, LoggerError, Result, Thrown};
use dashmap::DashMap;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Variables kept by scripts between invocations, shared by all threads.
pub type StaticVariables = DashMap<String, Value>;

/// What a script sees when it runs.
pub struct ScriptBindings<'a> {
    /// The event being routed; `None` for the default route script, which
    /// runs once at start.
    pub event: Option<&'a dyn LogEvent>,
    pub static_variables: &'a StaticVariables,
    /// Snapshot of the event's context map.
    pub context_map: ContextMap,
}

impl<'a> ScriptBindings<'a> {
    pub fn new(event: Option<&'a dyn LogEvent>, static_variables: &'a StaticVariables) -> Self {
        Self {
            event,
            static_variables,
            context_map: event.map(|e| e.context_map().clone()).unwrap_or_default(),
        }
    }
}

/// An opaque callable producing a route key.
///
/// A string result is used as is, `null` means "no key", any other value
/// is converted to its JSON text.
pub trait RouteScript: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, bindings: &ScriptBindings<'_>) -> Result<Value>;
}

/// A [`RouteScript`] backed by a closure.
///
/// # Example
///
/// ```
/// use rust_log_router::routing::{FnScript, RouteScript, ScriptBindings, StaticVariables};
/// use serde_json::{json, Value};
///
/// let script = FnScript::new("round-robin", |bindings: &ScriptBindings<'_>| {
///     let mut counter = bindings
///         .static_variables
///         .entry("count".to_string())
///         .or_insert(json!(0));
///     let n = counter.as_u64().unwrap_or(0);
///     *counter = json!(n + 1);
///     Ok(Value::String(if n % 2 == 0 { "even" } else { "odd" }.to_string()))
/// });
///
/// let statics = StaticVariables::new();
/// let bindings = ScriptBindings::new(None, &statics);
/// assert_eq!(script.evaluate(&bindings).unwrap(), json!("even"));
/// assert_eq!(script.evaluate(&bindings).unwrap(), json!("odd"));
/// ```
pub struct FnScript<F> {
    name: String,
    function: F,
}

impl<F> FnScript<F>
where
    F: Fn(&ScriptBindings<'_>) -> Result<Value> + Send + Sync,
{
    pub fn new(name: impl Into<String>, function: F) -> Self {
        Self {
            name: name.into(),
            function,
        }
    }
}

impl<F> RouteScript for FnScript<F>
where
    F: Fn(&ScriptBindings<'_>) -> Result<Value> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, bindings: &ScriptBindings<'_>) -> Result<Value> {
        (self.function)(bindings)
    }
}

/// Run a script, turning panics into errors and the result into a key.
pub fn evaluate_script(script: &dyn RouteScript, bindings: &ScriptBindings<'_>) -> Result<Option<String>> {
    let value = catch_unwind(AssertUnwindSafe(|| script.evaluate(bindings))).map_err(|panic| {
        let thrown = Thrown::from_panic(panic.as_ref());
        LoggerError::script(script.name(), thrown.message().unwrap_or("panicked"))
    })??;

    Ok(match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

/// How a routing appender turns an event into a route key.
#[derive(Clone)]
pub enum RouteResolver {
    /// Expand `${...}` variables against the event.
    Pattern(String),
    /// Evaluate a script; its result is the key as returned.
    Script(Arc<dyn RouteScript>),
}

impl RouteResolver {
    /// The key for `event`, or `None` when the result is empty.
    pub fn resolve(
        &self,
        event: &dyn LogEvent,
        substitutor: &StrSubstitutor,
        static_variables: &StaticVariables,
    ) -> Result<Option<String>> {
        let key = match self {
            RouteResolver::Pattern(pattern) => Some(substitutor.replace_event(pattern, Some(event))),
            RouteResolver::Script(script) => {
                let bindings = ScriptBindings::new(Some(event), static_variables);
                evaluate_script(script.as_ref(), &bindings)?
            }
        };

        Ok(key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty()))
    }
}

impl std::fmt::Debug for RouteResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteResolver::Pattern(pattern) => f.debug_tuple("Pattern").field(pattern).finish(),
            RouteResolver::Script(script) => f.debug_tuple("Script").field(&script.name()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogEntry, LogLevel};
    use serde_json::json;

    fn event(kind: &str) -> LogEntry {
        LogEntry::new(LogLevel::Info, "m").with_context_entry("type", kind)
    }

    #[test]
    fn test_pattern_resolution() {
        let resolver = RouteResolver::Pattern("${ctx:type}".into());
        let key = resolver
            .resolve(&event("Service"), &StrSubstitutor::new(), &StaticVariables::new())
            .unwrap();
        assert_eq!(key.as_deref(), Some("Service"));
    }

    #[test]
    fn test_blank_pattern_result_is_no_key() {
        let resolver = RouteResolver::Pattern("${ctx:type:-}  ".into());
        let key = resolver
            .resolve(&LogEntry::new(LogLevel::Info, "m"), &StrSubstitutor::new(), &StaticVariables::new())
            .unwrap();
        assert_eq!(key, None);
    }

    #[test]
    fn test_script_sees_bindings_and_statics() {
        let script = FnScript::new("by-type", |b: &ScriptBindings<'_>| {
            b.static_variables
                .entry("calls".to_string())
                .and_modify(|v| *v = json!(v.as_u64().unwrap_or(0) + 1))
                .or_insert(json!(1));
            Ok(b.context_map.get("type").cloned().map(Value::String).unwrap_or(Value::Null))
        });
        let resolver = RouteResolver::Script(Arc::new(script));
        let statics = StaticVariables::new();
        let subst = StrSubstitutor::new();

        assert_eq!(resolver.resolve(&event("Alert"), &subst, &statics).unwrap().as_deref(), Some("Alert"));
        assert_eq!(resolver.resolve(&LogEntry::new(LogLevel::Info, "m"), &subst, &statics).unwrap(), None);
        assert_eq!(statics.get("calls").map(|v| v.clone()), Some(json!(2)));
    }

    #[test]
    fn test_script_result_is_used_verbatim() {
        let resolver = RouteResolver::Script(Arc::new(FnScript::new("templated", |_: &ScriptBindings<'_>| {
            Ok(json!(" ${ctx:type}-route $${literal} "))
        })));
        let key = resolver
            .resolve(&event("Audit"), &StrSubstitutor::new(), &StaticVariables::new())
            .unwrap();
        assert_eq!(key.as_deref(), Some("${ctx:type}-route $${literal}"));
    }

    #[test]
    fn test_non_string_results_are_converted() {
        let statics = StaticVariables::new();
        let bindings = ScriptBindings::new(None, &statics);
        let number = FnScript::new("n", |_: &ScriptBindings<'_>| Ok(json!(42)));
        assert_eq!(evaluate_script(&number, &bindings).unwrap().as_deref(), Some("42"));
    }

    #[test]
    fn test_script_panic_becomes_error() {
        let statics = StaticVariables::new();
        let bindings = ScriptBindings::new(None, &statics);
        let broken = FnScript::new("broken", |_: &ScriptBindings<'_>| -> Result<Value> {
            panic!("script blew up")
        });
        let err = evaluate_script(&broken, &bindings).unwrap_err();
        assert!(matches!(err, LoggerError::Script { ref script, .. } if script == "broken"));
        assert!(err.to_string().contains("script blew up"));
    }
}
