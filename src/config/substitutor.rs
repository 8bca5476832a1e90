//! Variable substitution for configuration values and route patterns
//!
//! Supported forms:
//! - `${name}`: a configuration property
//! - `${prefix:key}`: a registered [`StrLookup`] (`ctx`, `event`, `marker`,
//!   `env`, `date`, `main`)
//! - `${prefix:key:-default}`: with a fallback when the lookup has no value
//! - `$${...}`: escaped, emitted as `${...}` without evaluation; configuration
//!   values use it to defer a variable until an event is available
//!
//! Variables that cannot be resolved are left in the output verbatim.

use crate::core::{LogEvent, LogTimestamp, ThreadContext, TimestampFormat};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

/// Nesting depth after which variables are no longer expanded.
const MAX_SUBSTITUTION_DEPTH: usize = 8;

const DEFAULT_SEPARATOR: &str = ":-";

/// A source of values for `${prefix:key}` variables.
pub trait StrLookup: Send + Sync {
    fn lookup(&self, key: &str, event: Option<&dyn LogEvent>) -> Option<String>;
}

/// `ctx`: the event's context map, or the current thread's without an event.
pub struct ContextMapLookup;

impl StrLookup for ContextMapLookup {
    fn lookup(&self, key: &str, event: Option<&dyn LogEvent>) -> Option<String> {
        match event {
            Some(event) => event.context_map().get(key).cloned(),
            None => ThreadContext::get(key),
        }
    }
}

/// `event`: fields of the event being processed.
pub struct EventLookup;

impl StrLookup for EventLookup {
    fn lookup(&self, key: &str, event: Option<&dyn LogEvent>) -> Option<String> {
        let event = event?;
        match key {
            "Level" => Some(event.level().to_string()),
            "Logger" => Some(event.logger_name().to_string()),
            "Marker" => event.marker().map(|m| m.name().to_string()),
            "Message" => Some(event.message().to_string()),
            "ThreadName" => event.thread_name().map(String::from),
            "ThreadId" => Some(event.thread_id().to_string()),
            "Timestamp" => Some(event.timestamp().epoch_millis().to_string()),
            "Exception" => event.thrown().map(|t| t.class_name().to_string()),
            _ => None,
        }
    }
}

/// `marker`: name of the event's marker.
pub struct MarkerLookup;

impl StrLookup for MarkerLookup {
    fn lookup(&self, _key: &str, event: Option<&dyn LogEvent>) -> Option<String> {
        event?.marker().map(|m| m.name().to_string())
    }
}

/// `env`: process environment variables.
pub struct EnvironmentLookup;

impl StrLookup for EnvironmentLookup {
    fn lookup(&self, key: &str, _event: Option<&dyn LogEvent>) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// `date`: the event time (or now) rendered with a strftime pattern.
pub struct DateLookup;

impl StrLookup for DateLookup {
    fn lookup(&self, key: &str, event: Option<&dyn LogEvent>) -> Option<String> {
        let timestamp = event.map_or_else(LogTimestamp::now, |e| e.timestamp());
        if key.is_empty() {
            return Some(TimestampFormat::Iso8601.format(&timestamp));
        }
        let mut out = String::new();
        write!(out, "{}", timestamp.to_datetime().format(key)).ok()?;
        Some(out)
    }
}

/// `main`: application arguments by position, and `--name value` pairs by name.
#[derive(Default)]
pub struct MainMapLookup {
    arguments: RwLock<HashMap<String, String>>,
}

impl MainMapLookup {
    pub fn set_arguments(&self, args: &[String]) {
        let mut map = HashMap::with_capacity(args.len() * 2);
        for (index, arg) in args.iter().enumerate() {
            map.insert(index.to_string(), arg.clone());
            if let Some(value) = args.get(index + 1) {
                map.entry(arg.trim_start_matches('-').to_string())
                    .or_insert_with(|| value.clone());
            }
        }
        *self.arguments.write() = map;
    }
}

impl StrLookup for MainMapLookup {
    fn lookup(&self, key: &str, _event: Option<&dyn LogEvent>) -> Option<String> {
        self.arguments.read().get(key).cloned()
    }
}

/// Expands variables against configuration properties and registered lookups.
///
/// # Example
///
/// ```
/// use rust_log_router::config::StrSubstitutor;
/// use rust_log_router::core::{LogEntry, LogLevel};
///
/// let subst = StrSubstitutor::new();
/// subst.set_property("dir", "logs");
///
/// let event = LogEntry::new(LogLevel::Info, "m").with_context_entry("type", "Audit");
/// assert_eq!(
///     subst.replace_event("${dir}/${ctx:type}.log", Some(&event)),
///     "logs/Audit.log"
/// );
/// assert_eq!(subst.replace("${ctx:missing:-none}"), "none");
/// ```
pub struct StrSubstitutor {
    properties: RwLock<HashMap<String, String>>,
    lookups: RwLock<HashMap<String, Arc<dyn StrLookup>>>,
    main: Arc<MainMapLookup>,
}

impl StrSubstitutor {
    pub fn new() -> Self {
        let main = Arc::new(MainMapLookup::default());
        let mut lookups: HashMap<String, Arc<dyn StrLookup>> = HashMap::new();
        lookups.insert("ctx".into(), Arc::new(ContextMapLookup));
        lookups.insert("event".into(), Arc::new(EventLookup));
        lookups.insert("marker".into(), Arc::new(MarkerLookup));
        lookups.insert("env".into(), Arc::new(EnvironmentLookup));
        lookups.insert("date".into(), Arc::new(DateLookup));
        lookups.insert("main".into(), main.clone());

        Self {
            properties: RwLock::new(HashMap::new()),
            lookups: RwLock::new(lookups),
            main,
        }
    }

    pub fn set_property(&self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.write().insert(name.into(), value.into());
    }

    pub fn property(&self, name: &str) -> Option<String> {
        self.properties.read().get(name).cloned()
    }

    /// Register (or replace) the lookup used for `${prefix:...}`.
    pub fn register_lookup(&self, prefix: &str, lookup: Arc<dyn StrLookup>) {
        self.lookups.write().insert(prefix.to_ascii_lowercase(), lookup);
    }

    pub fn set_main_arguments(&self, args: &[String]) {
        self.main.set_arguments(args);
    }

    pub fn replace(&self, source: &str) -> String {
        self.substitute(source, None, 0)
    }

    pub fn replace_event(&self, source: &str, event: Option<&dyn LogEvent>) -> String {
        self.substitute(source, event, 0)
    }

    fn substitute(&self, source: &str, event: Option<&dyn LogEvent>, depth: usize) -> String {
        if depth > MAX_SUBSTITUTION_DEPTH || !source.contains("${") {
            return source.to_string();
        }

        let mut out = String::with_capacity(source.len());
        let mut rest = source;
        while let Some(start) = rest.find("${") {
            let escaped = rest[..start].ends_with('$');
            let literal_end = if escaped { start - 1 } else { start };
            out.push_str(&rest[..literal_end]);

            let body_start = start + 2;
            let Some(body_len) = closing_brace(&rest[body_start..]) else {
                out.push_str(&rest[literal_end..]);
                return out;
            };
            let body = &rest[body_start..body_start + body_len];
            rest = &rest[body_start + body_len + 1..];
            if escaped {
                out.push_str("${");
                out.push_str(body);
                out.push('}');
                continue;
            }

            let variable = self.substitute(body, event, depth + 1);
            match self.resolve(&variable, event, depth) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push_str("${");
                    out.push_str(body);
                    out.push('}');
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn resolve(&self, variable: &str, event: Option<&dyn LogEvent>, depth: usize) -> Option<String> {
        let (name, default) = match variable.find(DEFAULT_SEPARATOR) {
            Some(pos) => (&variable[..pos], Some(&variable[pos + DEFAULT_SEPARATOR.len()..])),
            None => (variable, None),
        };

        if let Some((prefix, key)) = name.split_once(':') {
            let lookup = self.lookups.read().get(&prefix.to_ascii_lowercase()).cloned();
            if let Some(lookup) = lookup {
                // Values coming from events are never expanded again.
                return lookup.lookup(key, event).or_else(|| default.map(String::from));
            }
        }

        let property = self.properties.read().get(name).cloned();
        property
            .map(|value| self.substitute(&value, event, depth + 1))
            .or_else(|| default.map(String::from))
    }
}

impl Default for StrSubstitutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Offset of the `}` closing a variable body, skipping nested variables.
fn closing_brace(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut nested = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                nested += 1;
                i += 2;
                continue;
            }
            b'}' if nested == 0 => return Some(i),
            b'}' => nested -= 1,
            _ => {}
        }
        i += 1;
    }
    None
}
