//! Named appenders, properties and plugins of one logging configuration

use super::node::Node;
use super::plugins::PluginRegistry;
use super::substitutor::StrSubstitutor;
use crate::core::{Appender, LogEvent, Result, StatusLogger};
use crate::routing::RouteScript;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// The configuration collaborator of the routing engine.
///
/// Holds the appenders that routes may reference by name, the plugin
/// registry used to build appenders from nodes, and the substitutor for
/// `${...}` variables. Scripts registered with [`Configuration::add_script`]
/// can be referenced by name from routing appenders. Cloning shares plugins,
/// substitutor and scripts and takes a snapshot of the named appenders.
///
/// # Example
///
/// ```
/// use rust_log_router::config::{Configuration, Node};
///
/// let root = Node::new("Configuration")
///     .with_child(Node::new("Properties").with_child(
///         Node::new("Property").with_attribute("name", "app").with_attribute("value", "billing"),
///     ))
///     .with_child(Node::new("Appenders").with_child(
///         Node::new("List").with_attribute("name", "${app}-events"),
///     ));
///
/// let config = Configuration::from_node(&root).unwrap();
/// assert!(config.appender("billing-events").is_some());
/// config.stop();
/// ```
pub struct Configuration {
    plugins: Arc<PluginRegistry>,
    substitutor: Arc<StrSubstitutor>,
    scripts: Arc<RwLock<HashMap<String, Arc<dyn RouteScript>>>>,
    appenders: RwLock<Vec<Arc<dyn Appender>>>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::with_plugins(Arc::new(PluginRegistry::with_builtins()))
    }

    pub fn with_plugins(plugins: Arc<PluginRegistry>) -> Self {
        Self {
            plugins,
            substitutor: Arc::new(StrSubstitutor::new()),
            scripts: Arc::new(RwLock::new(HashMap::new())),
            appenders: RwLock::new(Vec::new()),
        }
    }

    /// Build a configuration with the built-in plugins and load `root` into it.
    pub fn from_node(root: &Node) -> Result<Self> {
        let config = Self::new();
        config.load(root)?;
        Ok(config)
    }

    pub fn plugins(&self) -> &Arc<PluginRegistry> {
        &self.plugins
    }

    pub fn substitutor(&self) -> &Arc<StrSubstitutor> {
        &self.substitutor
    }

    pub fn set_property(&self, name: impl Into<String>, value: impl Into<String>) {
        self.substitutor.set_property(name, value);
    }

    /// Register a script under its own name.
    pub fn add_script(&self, script: Arc<dyn RouteScript>) {
        self.scripts.write().insert(script.name().to_string(), script);
    }

    pub fn script(&self, name: &str) -> Option<Arc<dyn RouteScript>> {
        self.scripts.read().get(name).cloned()
    }

    /// Register a named appender, replacing any appender with the same name.
    pub fn add_appender(&self, appender: Arc<dyn Appender>) {
        let mut appenders = self.appenders.write();
        if let Some(existing) = appenders.iter_mut().find(|a| a.name() == appender.name()) {
            StatusLogger::global().warn(format!(
                "Appender '{}' is defined more than once, the last definition wins",
                appender.name()
            ));
            *existing = appender;
        } else {
            appenders.push(appender);
        }
    }

    pub fn appender(&self, name: &str) -> Option<Arc<dyn Appender>> {
        self.appenders
            .read()
            .iter()
            .find(|a| a.name() == name)
            .cloned()
    }

    pub fn appenders(&self) -> Vec<Arc<dyn Appender>> {
        self.appenders.read().clone()
    }

    /// Build an appender from `node`, substituting its attributes first.
    ///
    /// With an event, `${ctx:...}` and the other event lookups resolve
    /// against it. The appender is returned unstarted.
    pub fn create_appender(&self, node: &Node, event: Option<&dyn LogEvent>) -> Result<Arc<dyn Appender>> {
        let resolved = self.substitute_node(node, event);
        self.plugins.create(&resolved, self)
    }

    /// Copy of `node` with every attribute substituted.
    ///
    /// `Routes` children are copied untouched: their pattern and route
    /// definitions are templates evaluated per event.
    pub fn substitute_node(&self, node: &Node, event: Option<&dyn LogEvent>) -> Node {
        Node {
            plugin_type: node.plugin_type.clone(),
            attributes: node
                .attributes
                .iter()
                .map(|(name, value)| (name.clone(), self.substitutor.replace_event(value, event)))
                .collect(),
            children: node
                .children
                .iter()
                .map(|child| {
                    if child.is("Routes") {
                        child.clone()
                    } else {
                        self.substitute_node(child, event)
                    }
                })
                .collect(),
        }
    }

    /// Load `Properties` and `Appenders` sections, starting every appender.
    pub fn load(&self, root: &Node) -> Result<()> {
        for properties in root.children_of("Properties") {
            for property in properties.children_of("Property") {
                let value = self.substitutor.replace(property.attribute_or("value", ""));
                self.set_property(property.name()?, value);
            }
        }

        if let Some(section) = root.child("Appenders") {
            // Routing appenders may reference any other appender, so they come last.
            let (routing, plain): (Vec<&Node>, Vec<&Node>) =
                section.children.iter().partition(|node| node.is("Routing"));
            for node in plain.into_iter().chain(routing) {
                let appender = self.create_appender(node, None)?;
                appender.start();
                self.add_appender(appender);
            }
        }
        Ok(())
    }

    /// Stop every named appender, most recently added first.
    pub fn stop(&self) {
        let appenders = std::mem::take(&mut *self.appenders.write());
        for appender in appenders.iter().rev() {
            appender.stop();
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Configuration {
    fn clone(&self) -> Self {
        Self {
            plugins: Arc::clone(&self.plugins),
            substitutor: Arc::clone(&self.substitutor),
            scripts: Arc::clone(&self.scripts),
            appenders: RwLock::new(self.appenders.read().clone()),
        }
    }
}
