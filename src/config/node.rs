//! Parsed configuration tree
//!
//! A [`Node`] is one element of a configuration: a plugin type name, a map
//! of string attributes and ordered children. Trees can be written by hand
//! with the builder methods or loaded from JSON.
//!
//! # Example
//!
//! ```
//! use rust_log_router::config::Node;
//!
//! let node = Node::from_json(r#"{
//!     "type": "Route",
//!     "attributes": { "key": "Audit", "ref": "auditFile" }
//! }"#).unwrap();
//!
//! assert!(node.is("route"));
//! assert_eq!(node.attribute("Ref"), Some("auditFile"));
//! ```

use crate::core::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Plugin type name, compared case-insensitively
    #[serde(rename = "type")]
    pub plugin_type: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(plugin_type: impl Into<String>) -> Self {
        Self {
            plugin_type: plugin_type.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn is(&self, plugin_type: &str) -> bool {
        self.plugin_type.eq_ignore_ascii_case(plugin_type)
    }

    /// Attribute lookup ignoring the case of the name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn attribute_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.attribute(name).unwrap_or(default)
    }

    /// The `name` attribute, which every appender node must carry.
    pub fn name(&self) -> Result<&str> {
        self.attribute("name")
            .ok_or_else(|| LoggerError::config(&self.plugin_type, "missing required attribute 'name'"))
    }

    pub fn parse_attribute<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.attribute(name)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| {
                    LoggerError::config(
                        &self.plugin_type,
                        format!("invalid value '{}' for attribute '{}': {}", raw, name, e),
                    )
                })
            })
            .transpose()
    }

    pub fn bool_attribute(&self, name: &str, default: bool) -> Result<bool> {
        Ok(self.parse_attribute(name)?.unwrap_or(default))
    }

    /// First child of the given type.
    pub fn child(&self, plugin_type: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.is(plugin_type))
    }

    pub fn children_of<'a>(&'a self, plugin_type: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |child| child.is(plugin_type))
    }
}
