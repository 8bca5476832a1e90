//! Routes binding keys to appenders

use crate::config::Node;
use crate::core::Appender;
use std::fmt;
use std::sync::Arc;

/// What a route delivers to.
#[derive(Clone)]
pub enum RouteTarget {
    /// An appender owned by the configuration. Evicting its control never
    /// stops it.
    Reference(Arc<dyn Appender>),
    /// An appender node instantiated once per route key, with attributes
    /// substituted against the event that triggered the creation.
    Definition(Node),
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTarget::Reference(appender) => f.debug_tuple("Reference").field(&appender.name()).finish(),
            RouteTarget::Definition(node) => f.debug_tuple("Definition").field(&node.plugin_type).finish(),
        }
    }
}

/// One route; a route without a key is the default route.
#[derive(Debug, Clone)]
pub struct Route {
    key: Option<String>,
    target: RouteTarget,
}

impl Route {
    pub fn reference(appender: Arc<dyn Appender>) -> Self {
        Self {
            key: None,
            target: RouteTarget::Reference(appender),
        }
    }

    pub fn definition(node: Node) -> Self {
        Self {
            key: None,
            target: RouteTarget::Definition(node),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn target(&self) -> &RouteTarget {
        &self.target
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.target, RouteTarget::Reference(_))
    }
}

/// The declared routes of a routing appender.
#[derive(Debug, Clone, Default)]
pub struct Routes {
    routes: Vec<Route>,
}

impl Routes {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn push(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }

    /// The route declared for exactly this key.
    pub fn find(&self, key: &str) -> Option<&Route> {
        self.position(key).map(|index| &self.routes[index])
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.routes.iter().position(|route| route.key() == Some(key))
    }

    /// The first route declared without a key.
    pub fn unkeyed(&self) -> Option<&Route> {
        self.unkeyed_position().map(|index| &self.routes[index])
    }

    pub fn unkeyed_position(&self) -> Option<usize> {
        self.routes.iter().position(|route| route.key.is_none())
    }
}
