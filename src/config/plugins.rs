//! Plugin registry mapping configuration type names to appender factories

use super::configuration::Configuration;
use super::node::Node;
use crate::appenders::{ConsoleAppender, ConsoleTarget, FileAppender, ListAppender};
use crate::core::{
    Appender, Filter, FilterResult, JsonLayout, Layout, LogLevel, LoggerError, MarkerFilter,
    PatternLayout, Result, ThresholdFilter, DEFAULT_CONVERSION_PATTERN,
};
use crate::routing::RoutingAppender;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds an appender from its (already substituted) configuration node.
pub type AppenderFactory =
    Arc<dyn Fn(&Node, &Configuration) -> Result<Arc<dyn Appender>> + Send + Sync>;

/// Case-insensitive registry of appender factories.
///
/// # Example
///
/// ```
/// use rust_log_router::appenders::ListAppender;
/// use rust_log_router::config::{Configuration, Node, PluginRegistry};
/// use std::sync::Arc;
///
/// let plugins = PluginRegistry::with_builtins();
/// plugins.register("Memory", |node, _config| {
///     Ok(Arc::new(ListAppender::new(node.name()?)))
/// });
///
/// let config = Configuration::with_plugins(Arc::new(plugins));
/// let appender = config
///     .create_appender(&Node::new("memory").with_attribute("name", "mem"), None)
///     .unwrap();
/// assert_eq!(appender.name(), "mem");
/// ```
#[derive(Default)]
pub struct PluginRegistry {
    factories: RwLock<HashMap<String, AppenderFactory>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with `Console`, `File`, `List` and `Routing`.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register("Console", build_console);
        registry.register("File", build_file);
        registry.register("List", build_list);
        registry.register("Routing", |node, config| {
            Ok(Arc::new(RoutingAppender::from_node(node, config)?))
        });
        registry
    }

    pub fn register<F>(&self, plugin_type: &str, factory: F)
    where
        F: Fn(&Node, &Configuration) -> Result<Arc<dyn Appender>> + Send + Sync + 'static,
    {
        self.factories
            .write()
            .insert(plugin_type.to_ascii_lowercase(), Arc::new(factory));
    }

    pub fn contains(&self, plugin_type: &str) -> bool {
        self.factories
            .read()
            .contains_key(&plugin_type.to_ascii_lowercase())
    }

    pub fn create(&self, node: &Node, config: &Configuration) -> Result<Arc<dyn Appender>> {
        // Factories may create nested appenders, so the lock is not held while they run.
        let factory = self
            .factories
            .read()
            .get(&node.plugin_type.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| LoggerError::UnknownPlugin(node.plugin_type.clone()))?;
        factory(node, config)
    }
}

/// The layout declared among `node`'s children, if any.
pub fn build_layout(node: &Node) -> Result<Option<Arc<dyn Layout>>> {
    for child in &node.children {
        if child.is("PatternLayout") {
            let mut layout =
                PatternLayout::new(child.attribute_or("pattern", DEFAULT_CONVERSION_PATTERN))?
                    .with_always_write_exceptions(child.bool_attribute("alwaysWriteExceptions", true)?);
            if let Some(header) = child.attribute("header") {
                layout = layout.with_header(header);
            }
            if let Some(footer) = child.attribute("footer") {
                layout = layout.with_footer(footer);
            }
            return Ok(Some(Arc::new(layout)));
        }
        if child.is("JsonLayout") {
            let layout = JsonLayout::new()
                .with_compact(child.bool_attribute("compact", true)?)
                .with_event_eol(child.bool_attribute("eventEol", true)?);
            return Ok(Some(Arc::new(layout)));
        }
    }
    Ok(None)
}

/// The filters declared among `node`'s children, in order.
///
/// A `Filters` child contributes its own children.
pub fn build_filters(node: &Node) -> Result<Vec<Arc<dyn Filter>>> {
    let mut filters: Vec<Arc<dyn Filter>> = Vec::new();
    for child in &node.children {
        if child.is("Filters") {
            filters.extend(build_filters(child)?);
        } else if child.is("ThresholdFilter") {
            let level = child
                .parse_attribute::<LogLevel>("level")?
                .unwrap_or(LogLevel::Error);
            filters.push(Arc::new(ThresholdFilter::with_results(
                level,
                match_result(child, "onMatch", FilterResult::Neutral)?,
                match_result(child, "onMismatch", FilterResult::Deny)?,
            )));
        } else if child.is("MarkerFilter") {
            let marker = child
                .attribute("marker")
                .ok_or_else(|| LoggerError::config("MarkerFilter", "missing required attribute 'marker'"))?;
            filters.push(Arc::new(MarkerFilter::new(
                marker,
                match_result(child, "onMatch", FilterResult::Neutral)?,
                match_result(child, "onMismatch", FilterResult::Deny)?,
            )));
        }
    }
    Ok(filters)
}

fn match_result(node: &Node, name: &str, default: FilterResult) -> Result<FilterResult> {
    Ok(node.parse_attribute(name)?.unwrap_or(default))
}

fn attach_filters(appender: &dyn Appender, node: &Node) -> Result<()> {
    let filters = build_filters(node)?;
    if let Some(filterable) = appender.filterable() {
        for filter in filters {
            filterable.add_filter(filter);
        }
    }
    Ok(())
}

fn build_console(node: &Node, _config: &Configuration) -> Result<Arc<dyn Appender>> {
    let target = node
        .parse_attribute::<ConsoleTarget>("target")?
        .unwrap_or_default();
    let mut appender = ConsoleAppender::new()
        .with_name(node.name()?)
        .with_target(target)
        .with_colors(node.bool_attribute("colors", cfg!(feature = "console"))?);
    if let Some(layout) = build_layout(node)? {
        appender = appender.with_layout(layout);
    }
    attach_filters(&appender, node)?;
    Ok(Arc::new(appender))
}

fn build_file(node: &Node, _config: &Configuration) -> Result<Arc<dyn Appender>> {
    let file_name = node
        .attribute("fileName")
        .ok_or_else(|| LoggerError::config("File", "missing required attribute 'fileName'"))?;
    let mut appender = FileAppender::new(node.name()?, file_name)?
        .with_immediate_flush(node.bool_attribute("immediateFlush", true)?)
        .with_locking(node.bool_attribute("locking", false)?);
    if let Some(layout) = build_layout(node)? {
        appender = appender.with_layout(layout);
    }
    attach_filters(&appender, node)?;
    Ok(Arc::new(appender))
}

fn build_list(node: &Node, _config: &Configuration) -> Result<Arc<dyn Appender>> {
    let mut appender = ListAppender::new(node.name()?);
    if let Some(layout) = build_layout(node)? {
        appender = appender.with_layout(layout);
    }
    attach_filters(&appender, node)?;
    Ok(Arc::new(appender))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Filterable, LogEntry};

    #[test]
    fn test_unknown_plugin() {
        let config = Configuration::new();
        let err = config
            .plugins()
            .create(&Node::new("Carrier").with_attribute("name", "pigeon"), &config)
            .err()
            .unwrap();
        assert!(matches!(err, LoggerError::UnknownPlugin(t) if t == "Carrier"));
    }

    #[test]
    fn test_type_names_ignore_case() {
        let plugins = PluginRegistry::with_builtins();
        assert!(plugins.contains("console"));
        assert!(plugins.contains("ROUTING"));
        assert!(!plugins.contains("Socket"));
    }

    #[test]
    fn test_list_with_layout_and_filter() {
        let config = Configuration::new();
        let node = Node::new("List")
            .with_attribute("name", "captured")
            .with_child(Node::new("PatternLayout").with_attribute("pattern", "%p %m"))
            .with_child(Node::new("ThresholdFilter").with_attribute("level", "WARN"));
        let appender = config.plugins().create(&node, &config).unwrap();

        assert_eq!(appender.name(), "captured");
        let entry = LogEntry::new(LogLevel::Info, "quiet");
        assert!(appender.filterable().unwrap().is_filtered(&entry));
        let layout = appender.layout().unwrap();
        assert_eq!(layout.format(&LogEntry::new(LogLevel::Warn, "loud")), "WARN loud");
    }

    #[test]
    fn test_nested_filters() {
        let node = Node::new("List").with_child(
            Node::new("Filters")
                .with_child(
                    Node::new("MarkerFilter")
                        .with_attribute("marker", "AUDIT")
                        .with_attribute("onMatch", "ACCEPT")
                        .with_attribute("onMismatch", "NEUTRAL"),
                )
                .with_child(Node::new("ThresholdFilter").with_attribute("level", "ERROR")),
        );
        let filters = build_filters(&node).unwrap();
        assert_eq!(filters.len(), 2);
        let entry = LogEntry::new(LogLevel::Debug, "m");
        assert_eq!(filters[1].filter(&entry), FilterResult::Deny);
    }

    #[test]
    fn test_invalid_filter_result() {
        let node = Node::new("List").with_child(
            Node::new("ThresholdFilter")
                .with_attribute("level", "INFO")
                .with_attribute("onMatch", "MAYBE"),
        );
        assert!(build_filters(&node).is_err());
    }

    #[test]
    fn test_json_layout() {
        let node = Node::new("Console").with_child(Node::new("JsonLayout").with_attribute("eventEol", "false"));
        let layout = build_layout(&node).unwrap().unwrap();
        assert_eq!(layout.content_type(), "application/json; charset=UTF-8");
        assert!(!layout.format(&LogEntry::new(LogLevel::Info, "m")).ends_with('\n'));
    }
}
