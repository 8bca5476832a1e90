//! The routing appender
//!
//! For every event: apply the rewrite policy, resolve a route key, pick the
//! route declared for that key (or the default route), then forward through
//! the registry, which creates the route's appender on first use.

use super::control::{AppendOutcome, AppenderControl};
use super::metrics::RoutingMetrics;
use super::purge::{IdlePurgePolicy, ManualPurgePolicy, PurgePolicy};
use super::registry::AppenderRegistry;
use super::resolver::{evaluate_script, RouteResolver, RouteScript, ScriptBindings, StaticVariables};
use super::route::{Route, RouteTarget, Routes};
use crate::bridge::RewritePolicyAdapter;
use crate::config::{build_filters, Configuration, Node};
use crate::core::{
    Appender, DefaultErrorHandler, ErrorHandler, Filter, FilterSet, Filterable, LifeCycle, LogEvent,
    LoggerError, MapRewriteMode, MapRewritePolicy, Result, RewritePolicy, StatusLogger, Thrown,
};
use crate::legacy::PropertyRewritePolicy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Registry key of the default route when it references a configured appender,
/// and route key used when the default route has no key of its own.
pub const DEFAULT_KEY: &str = "ROUTING_APPENDER_DEFAULT";

/// Dispatches each event to an appender chosen by a route key.
///
/// # Example
///
/// ```
/// use rust_log_router::prelude::*;
/// use std::sync::Arc;
///
/// let audit = Arc::new(ListAppender::new("audit"));
/// let routing = RoutingAppender::builder("routing")
///     .pattern("${ctx:type}")
///     .route(Route::reference(audit.clone()).with_key("Audit"))
///     .route(Route::definition(Node::new("List").with_attribute("name", "${ctx:type}")))
///     .build()
///     .unwrap();
/// routing.start();
///
/// routing.append(&LogEntry::new(LogLevel::Info, "login").with_context_entry("type", "Audit")).unwrap();
/// routing.append(&LogEntry::new(LogLevel::Info, "query").with_context_entry("type", "Db")).unwrap();
///
/// assert_eq!(audit.messages(), vec!["login".to_string()]);
/// assert!(routing.appenders().contains_key("Db"));
/// routing.stop();
/// ```
pub struct RoutingAppender {
    name: String,
    resolver: RouteResolver,
    routes: Routes,
    default_route_script: Option<Arc<dyn RouteScript>>,
    default_route: RwLock<Option<usize>>,
    rewrite_policy: Option<Arc<dyn RewritePolicy>>,
    purge_policy: Option<Arc<dyn PurgePolicy>>,
    registry: Arc<AppenderRegistry>,
    config: Configuration,
    static_variables: Arc<StaticVariables>,
    error_handler: Arc<dyn ErrorHandler>,
    ignore_exceptions: bool,
    filters: FilterSet,
    life_cycle: LifeCycle,
}

impl RoutingAppender {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> RoutingAppenderBuilder {
        RoutingAppenderBuilder::new(name)
    }

    /// Build from a `Routing` configuration node.
    ///
    /// Referenced appenders are looked up in `config` now, so they must be
    /// defined before the routing appender.
    pub fn from_node(node: &Node, config: &Configuration) -> Result<Self> {
        let name = node.name()?;
        let routes_node = node
            .child("Routes")
            .ok_or_else(|| LoggerError::config(name, "a Routes element is required"))?;

        let mut builder = RoutingAppender::builder(name)
            .configuration(config.clone())
            .ignore_exceptions(node.bool_attribute("ignoreExceptions", true)?);

        builder = match routes_node.attribute("pattern") {
            Some(pattern) => builder.pattern(pattern),
            None => match routes_node.child("ScriptRef") {
                Some(script_ref) => builder.script(lookup_script(config, script_ref.attribute_or("ref", ""))?),
                None => builder,
            },
        };

        for route_node in routes_node.children_of("Route") {
            let route = match route_node.attribute("ref") {
                Some(reference) => {
                    let appender = config
                        .appender(reference)
                        .ok_or_else(|| LoggerError::UnknownAppender(reference.to_string()))?;
                    Route::reference(appender)
                }
                None => {
                    let definition = route_node.children.first().ok_or_else(|| {
                        LoggerError::config(name, "a Route needs a ref or an appender definition")
                    })?;
                    Route::definition(definition.clone())
                }
            };
            builder = builder.route(match route_node.attribute("key") {
                Some(key) => route.with_key(key),
                None => route,
            });
        }

        if let Some(script) = node.attribute("defaultRouteScript") {
            builder = builder.default_route_script(lookup_script(config, script)?);
        }

        if let Some(policy) = node.child("IdlePurgePolicy") {
            builder = builder.purge_policy(Arc::new(IdlePurgePolicy::from_node(policy)?));
        } else if node.child("ManualPurgePolicy").is_some() {
            builder = builder.purge_policy(Arc::new(ManualPurgePolicy::new()));
        }

        if let Some(policy) = node.child("MapRewritePolicy") {
            let mode = policy
                .parse_attribute::<MapRewriteMode>("mode")?
                .unwrap_or(MapRewriteMode::Add);
            let pairs = policy
                .children_of("KeyValuePair")
                .map(|pair| {
                    (
                        pair.attribute_or("key", "").to_string(),
                        pair.attribute_or("value", "").to_string(),
                    )
                })
                .collect();
            builder = builder.rewrite_policy(Arc::new(MapRewritePolicy::new(mode, pairs)));
        } else if let Some(policy) = node.child("PropertyRewritePolicy") {
            let legacy = PropertyRewritePolicy::parse(policy.attribute_or("properties", ""));
            builder = builder.rewrite_policy(RewritePolicyAdapter::adapt(Arc::new(legacy)));
        }

        for filter in build_filters(node)? {
            builder = builder.filter(filter);
        }

        builder.build()
    }

    /// Stop and remove the appender serving `key`.
    ///
    /// Returns false when there was none. A later event for the key creates
    /// a fresh appender.
    pub fn delete_appender(&self, key: &str) -> bool {
        let deleted = self.registry.delete(key);
        if deleted {
            StatusLogger::global().debug(format!("Deleted route appender '{}' of '{}'", key, self.name));
        }
        deleted
    }

    /// The live route appenders by registry key.
    pub fn appenders(&self) -> HashMap<String, Arc<AppenderControl>> {
        self.registry.snapshot()
    }

    /// Variables shared by the route scripts of this appender.
    pub fn static_variables(&self) -> &Arc<StaticVariables> {
        &self.static_variables
    }

    pub fn metrics(&self) -> &Arc<RoutingMetrics> {
        self.registry.metrics()
    }

    pub fn purge_policy(&self) -> Option<&Arc<dyn PurgePolicy>> {
        self.purge_policy.as_ref()
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// The route key used for events that resolve to no key.
    pub fn default_key(&self) -> Option<String> {
        let index = (*self.default_route.read())?;
        let route = self.routes.get(index)?;
        Some(route.key().unwrap_or(DEFAULT_KEY).to_string())
    }

    fn select_default_route(&self) -> Option<usize> {
        if let Some(script) = &self.default_route_script {
            let bindings = ScriptBindings::new(None, &self.static_variables);
            match evaluate_script(script.as_ref(), &bindings) {
                Ok(Some(key)) => match self.routes.position(&key) {
                    Some(index) => return Some(index),
                    None => StatusLogger::global().warn(format!(
                        "Default route script of '{}' returned '{}', which matches no route",
                        self.name, key
                    )),
                },
                Ok(None) => {}
                Err(e) => StatusLogger::global()
                    .error_with_cause(format!("Default route script of '{}' failed", self.name), &e),
            }
        }
        self.routes.unkeyed_position()
    }

    fn register_references(&self, default_route: Option<usize>) {
        for (index, route) in self.routes.iter().enumerate() {
            let RouteTarget::Reference(appender) = route.target() else {
                continue;
            };
            let key = if Some(index) == default_route {
                DEFAULT_KEY
            } else {
                match route.key() {
                    Some(key) => key,
                    None => continue,
                }
            };
            let appender = Arc::clone(appender);
            if let Err(e) = self
                .registry
                .get_or_create(key, || Ok(AppenderControl::referenced(key, appender)))
            {
                StatusLogger::global().error_with_cause(format!("Unable to register route '{}'", key), &e);
            }
        }
    }

    /// The registry key and route serving `key`.
    fn select(&self, key: &str) -> Option<(String, &Route)> {
        let default_route = *self.default_route.read();
        let index = self.routes.position(key).or(default_route)?;
        let route = self.routes.get(index)?;
        if route.is_reference() && Some(index) == default_route {
            Some((DEFAULT_KEY.to_string(), route))
        } else {
            Some((key.to_string(), route))
        }
    }

    fn create_control(&self, key: &str, route: &Route, event: &dyn LogEvent) -> Result<AppenderControl> {
        // An append that got past the started check may race stop()
        if !self.life_cycle.is_started() {
            return Err(LoggerError::Stopped(self.name.clone()));
        }
        let node = match route.target() {
            RouteTarget::Reference(appender) => {
                return Ok(AppenderControl::referenced(key, Arc::clone(appender)));
            }
            RouteTarget::Definition(node) => node,
        };

        let built = catch_unwind(AssertUnwindSafe(|| {
            let appender = self.config.create_appender(node, Some(event))?;
            appender.start();
            Ok(appender)
        }))
        .unwrap_or_else(|panic| {
            let thrown = Thrown::from_panic(panic.as_ref());
            Err(LoggerError::other(format!(
                "factory panicked: {}",
                thrown.message().unwrap_or("Unknown panic")
            )))
        });

        match built {
            Ok(appender) => {
                self.metrics().record_created();
                StatusLogger::global().debug(format!(
                    "Created appender '{}' for route '{}' of '{}'",
                    appender.name(),
                    key,
                    self.name
                ));
                Ok(AppenderControl::created(key, appender))
            }
            Err(e) => {
                self.metrics().record_construction_failure();
                StatusLogger::global().error_with_cause(
                    format!("Unable to create appender for route '{}' of '{}', event dropped", key, self.name),
                    &e,
                );
                Err(LoggerError::construction(key, e.to_string()))
            }
        }
    }

    fn resolve_key(&self, event: &dyn LogEvent) -> Option<String> {
        let resolved = self
            .resolver
            .resolve(event, self.config.substitutor(), &self.static_variables)
            .unwrap_or_else(|e| {
                self.error_handler.error_with_event(
                    &format!("Unable to resolve route key: {}", e),
                    event,
                    Some(&Thrown::from_error(&e)),
                );
                None
            });
        resolved.or_else(|| self.default_key())
    }

    fn drop_event(&self, message: String) {
        self.metrics().record_dropped();
        StatusLogger::global().warn(message);
    }

    fn route(&self, event: &dyn LogEvent) -> Result<()> {
        let Some(key) = self.resolve_key(event) else {
            self.drop_event(format!(
                "No route key for event of '{}' and no default route, event dropped",
                self.name
            ));
            return Ok(());
        };
        let Some((registry_key, route)) = self.select(&key) else {
            self.drop_event(format!(
                "No route for key '{}' in '{}' and no default route, event dropped",
                key, self.name
            ));
            return Ok(());
        };

        let outcome = self
            .registry
            .forward(&registry_key, event, || self.create_control(&registry_key, route, event));
        if !self.life_cycle.is_started() {
            // Stop whatever was registered after stop_all() ran
            self.registry.stop_all();
        }

        match outcome {
            Ok(AppendOutcome::Appended) => {
                self.metrics().record_forwarded();
                if let Some(policy) = &self.purge_policy {
                    policy.update(&registry_key, event);
                }
                Ok(())
            }
            Ok(AppendOutcome::Failed(e)) => {
                self.metrics().record_dropped();
                if let Some(policy) = &self.purge_policy {
                    policy.update(&registry_key, event);
                }
                if self.ignore_exceptions {
                    self.error_handler.error_with_event(
                        &format!("Unable to append to route '{}': {}", registry_key, e),
                        event,
                        Some(&Thrown::from_error(&e)),
                    );
                    Ok(())
                } else {
                    Err(e)
                }
            }
            // Already reported by the control or the registry
            Ok(AppendOutcome::Recursive) | Ok(AppendOutcome::Retired) | Err(_) => {
                self.metrics().record_dropped();
                Ok(())
            }
        }
    }
}

impl Appender for RoutingAppender {
    fn append(&self, event: &dyn LogEvent) -> Result<()> {
        if !self.life_cycle.is_started() {
            return Err(LoggerError::NotStarted(self.name.clone()));
        }
        if self.filters.is_filtered(event) {
            return Ok(());
        }
        match self.rewrite_policy.as_ref().and_then(|policy| policy.rewrite(event)) {
            Some(rewritten) => self.route(&rewritten),
            None => self.route(event),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) {
        if !self.life_cycle.start() {
            return;
        }
        let default_route = self.select_default_route();
        *self.default_route.write() = default_route;
        self.register_references(default_route);
        if let Some(policy) = &self.purge_policy {
            policy.initialize(&self.registry);
        }
    }

    /// Stops every route appender, then the purge policy.
    fn stop(&self) {
        if !self.life_cycle.stop() {
            return;
        }
        self.registry.stop_all();
        if let Some(policy) = &self.purge_policy {
            policy.stop();
        }
    }

    fn is_started(&self) -> bool {
        self.life_cycle.is_started()
    }

    fn flush(&self) -> Result<()> {
        for control in self.registry.snapshot().values() {
            control.appender().flush()?;
        }
        Ok(())
    }

    fn filterable(&self) -> Option<&dyn Filterable> {
        Some(&self.filters)
    }
}

impl std::fmt::Debug for RoutingAppender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingAppender")
            .field("name", &self.name)
            .field("resolver", &self.resolver)
            .field("routes", &self.routes)
            .field("appenders", &self.registry.keys())
            .finish()
    }
}

fn lookup_script(config: &Configuration, name: &str) -> Result<Arc<dyn RouteScript>> {
    config
        .script(name)
        .ok_or_else(|| LoggerError::config("Routing", format!("no script named '{}' is registered", name)))
}

/// Builder for [`RoutingAppender`]
pub struct RoutingAppenderBuilder {
    name: String,
    resolver: Option<RouteResolver>,
    routes: Routes,
    default_route_script: Option<Arc<dyn RouteScript>>,
    rewrite_policy: Option<Arc<dyn RewritePolicy>>,
    purge_policy: Option<Arc<dyn PurgePolicy>>,
    config: Option<Configuration>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
    ignore_exceptions: bool,
    filters: Vec<Arc<dyn Filter>>,
}

impl RoutingAppenderBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolver: None,
            routes: Routes::default(),
            default_route_script: None,
            rewrite_policy: None,
            purge_policy: None,
            config: None,
            error_handler: None,
            ignore_exceptions: true,
            filters: Vec::new(),
        }
    }

    /// Resolve keys by expanding `pattern` against each event
    #[must_use = "builder methods return a new value"]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.resolver = Some(RouteResolver::Pattern(pattern.into()));
        self
    }

    /// Resolve keys by evaluating `script` for each event
    #[must_use = "builder methods return a new value"]
    pub fn script(mut self, script: Arc<dyn RouteScript>) -> Self {
        self.resolver = Some(RouteResolver::Script(script));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn routes(mut self, routes: Routes) -> Self {
        self.routes = routes;
        self
    }

    /// Script run once at start whose result names the default route's key
    #[must_use = "builder methods return a new value"]
    pub fn default_route_script(mut self, script: Arc<dyn RouteScript>) -> Self {
        self.default_route_script = Some(script);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn rewrite_policy(mut self, policy: Arc<dyn RewritePolicy>) -> Self {
        self.rewrite_policy = Some(policy);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn purge_policy(mut self, policy: Arc<dyn PurgePolicy>) -> Self {
        self.purge_policy = Some(policy);
        self
    }

    /// Configuration supplying substitution and plugins for route definitions
    #[must_use = "builder methods return a new value"]
    pub fn configuration(mut self, config: Configuration) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Report append failures to the error handler instead of returning them
    #[must_use = "builder methods return a new value"]
    pub fn ignore_exceptions(mut self, ignore: bool) -> Self {
        self.ignore_exceptions = ignore;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn build(self) -> Result<RoutingAppender> {
        let resolver = self.resolver.ok_or_else(|| {
            LoggerError::config(&self.name, "routes need a pattern or a script")
        })?;
        if self.routes.is_empty() {
            return Err(LoggerError::config(&self.name, "no routes defined"));
        }
        let unkeyed = self.routes.iter().filter(|route| route.key().is_none()).count();
        if unkeyed > 1 {
            StatusLogger::global().warn(format!(
                "'{}' declares {} default routes, only the first is used",
                self.name, unkeyed
            ));
        }

        let filters = FilterSet::new();
        for filter in self.filters {
            filters.add_filter(filter);
        }
        let error_handler = self
            .error_handler
            .unwrap_or_else(|| Arc::new(DefaultErrorHandler::new(self.name.clone())));

        Ok(RoutingAppender {
            resolver,
            routes: self.routes,
            default_route_script: self.default_route_script,
            default_route: RwLock::new(None),
            rewrite_policy: self.rewrite_policy,
            purge_policy: self.purge_policy,
            registry: Arc::new(AppenderRegistry::new()),
            config: self.config.unwrap_or_default(),
            static_variables: Arc::new(StaticVariables::new()),
            error_handler,
            ignore_exceptions: self.ignore_exceptions,
            filters,
            life_cycle: LifeCycle::new(),
            name: self.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::ListAppender;
    use crate::config::PluginRegistry;
    use crate::core::{LogEntry, LogLevel, ThresholdFilter};
    use crate::routing::FnScript;
    use parking_lot::Mutex;
    use serde_json::json;

    type Built = Arc<Mutex<Vec<Arc<ListAppender>>>>;

    /// Configuration whose `Capture` plugin hands out inspectable list appenders.
    fn capturing_config() -> (Configuration, Built) {
        let built: Built = Arc::new(Mutex::new(Vec::new()));
        let plugins = PluginRegistry::with_builtins();
        let sink = Arc::clone(&built);
        plugins.register("Capture", move |node, _config| {
            let list = Arc::new(ListAppender::new(node.name()?));
            sink.lock().push(Arc::clone(&list));
            let appender: Arc<dyn Appender> = list;
            Ok(appender)
        });
        (Configuration::with_plugins(Arc::new(plugins)), built)
    }

    fn typed(kind: &str, message: &str) -> LogEntry {
        LogEntry::new(LogLevel::Info, message).with_context_entry("type", kind)
    }

    fn capture_route() -> Route {
        Route::definition(Node::new("Capture").with_attribute("name", "${ctx:type}"))
    }

    #[test]
    fn test_build_requires_resolver_and_routes() {
        assert!(RoutingAppender::builder("r").route(capture_route()).build().is_err());
        assert!(RoutingAppender::builder("r").pattern("${ctx:type}").build().is_err());
    }

    #[test]
    fn test_definition_instantiated_once_per_key() {
        let (config, built) = capturing_config();
        let routing = RoutingAppender::builder("routing")
            .configuration(config)
            .pattern("${ctx:type}")
            .route(capture_route())
            .build()
            .unwrap();
        routing.start();

        routing.append(&typed("Service", "a")).unwrap();
        routing.append(&typed("Service", "b")).unwrap();
        routing.append(&typed("Alert", "c")).unwrap();

        let built = built.lock();
        assert_eq!(built.len(), 2);
        assert_eq!(built[0].name(), "Service");
        assert_eq!(built[0].messages(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(built[1].messages(), vec!["c".to_string()]);
        assert!(built.iter().all(|list| list.is_started()));
        assert_eq!(routing.metrics().created_count(), 2);
        assert_eq!(routing.metrics().forwarded_count(), 3);
        routing.stop();
    }

    #[test]
    fn test_referenced_default_route_is_shared_and_eager() {
        let fallback = Arc::new(ListAppender::new("fallback"));
        let routing = RoutingAppender::builder("routing")
            .pattern("${ctx:type}")
            .route(Route::reference(Arc::new(ListAppender::new("svc"))).with_key("Service"))
            .route(Route::reference(fallback.clone()))
            .build()
            .unwrap();
        routing.start();

        let keys = routing.appenders();
        assert!(keys.contains_key(DEFAULT_KEY));
        assert!(keys.contains_key("Service"));

        routing.append(&typed("Other", "x")).unwrap();
        routing.append(&LogEntry::new(LogLevel::Info, "untyped")).unwrap();
        assert_eq!(fallback.len(), 2);
        assert_eq!(routing.appenders().len(), 2);

        routing.stop();
        assert_eq!(fallback.stop_count(), 0);
    }

    #[test]
    fn test_unroutable_event_is_dropped() {
        let service = Arc::new(ListAppender::new("svc"));
        let routing = RoutingAppender::builder("routing")
            .pattern("${ctx:type:-}")
            .route(Route::reference(service.clone()).with_key("Service"))
            .build()
            .unwrap();
        routing.start();

        assert!(routing.append(&LogEntry::new(LogLevel::Info, "no key")).is_ok());
        assert!(routing.append(&typed("Unknown", "no route")).is_ok());
        assert!(service.is_empty());
        assert_eq!(routing.metrics().dropped_count(), 2);
        routing.stop();
    }

    #[test]
    fn test_default_route_script_selects_default_key() {
        let service1 = Arc::new(ListAppender::new("svc1"));
        let service2 = Arc::new(ListAppender::new("svc2"));
        let routing = RoutingAppender::builder("routing")
            .script(Arc::new(FnScript::new("none", |_: &ScriptBindings<'_>| Ok(json!(null)))))
            .default_route_script(Arc::new(FnScript::new("pick", |_: &ScriptBindings<'_>| {
                Ok(json!("Service2"))
            })))
            .route(Route::reference(service1.clone()).with_key("Service1"))
            .route(Route::reference(service2.clone()).with_key("Service2"))
            .build()
            .unwrap();
        routing.start();

        assert_eq!(routing.default_key().as_deref(), Some("Service2"));
        routing.append(&LogEntry::new(LogLevel::Info, "m")).unwrap();
        assert_eq!(service2.len(), 1);
        assert!(service1.is_empty());
        routing.stop();
    }

    #[test]
    fn test_rewrite_applies_before_resolution() {
        let (config, built) = capturing_config();
        let routing = RoutingAppender::builder("routing")
            .configuration(config)
            .pattern("${ctx:type}")
            .rewrite_policy(Arc::new(MapRewritePolicy::new(
                MapRewriteMode::Add,
                vec![("type".into(), "Rewritten".into())],
            )))
            .route(capture_route())
            .build()
            .unwrap();
        routing.start();

        routing.append(&typed("Original", "m")).unwrap();
        let built = built.lock();
        assert_eq!(built[0].name(), "Rewritten");
        assert_eq!(
            built[0].events()[0].context_map().get("type").map(String::as_str),
            Some("Rewritten")
        );
        routing.stop();
    }

    #[test]
    fn test_append_failures_follow_ignore_exceptions() {
        let failing = Arc::new(ListAppender::new("failing"));
        failing.set_failing(true);

        let lenient = RoutingAppender::builder("lenient")
            .pattern("x")
            .route(Route::reference(failing.clone()).with_key("x"))
            .build()
            .unwrap();
        lenient.start();
        assert!(lenient.append(&LogEntry::new(LogLevel::Error, "m")).is_ok());

        let strict = RoutingAppender::builder("strict")
            .pattern("x")
            .ignore_exceptions(false)
            .route(Route::reference(failing).with_key("x"))
            .build()
            .unwrap();
        strict.start();
        assert!(strict.append(&LogEntry::new(LogLevel::Error, "m")).is_err());
    }

    #[test]
    fn test_construction_failure_is_retried() {
        let routing = RoutingAppender::builder("routing")
            .pattern("${ctx:type}")
            .route(Route::definition(Node::new("Smtp").with_attribute("name", "${ctx:type}")))
            .build()
            .unwrap();
        routing.start();

        routing.append(&typed("Mail", "a")).unwrap();
        routing.append(&typed("Mail", "b")).unwrap();
        assert_eq!(routing.metrics().construction_failures(), 2);
        assert!(routing.appenders().is_empty());
        routing.stop();
    }

    #[test]
    fn test_delete_and_stop() {
        let (config, built) = capturing_config();
        let routing = RoutingAppender::builder("routing")
            .configuration(config)
            .pattern("${ctx:type}")
            .route(capture_route())
            .build()
            .unwrap();
        routing.start();

        routing.append(&typed("A", "1")).unwrap();
        assert!(routing.delete_appender("A"));
        assert!(!routing.delete_appender("A"));
        routing.append(&typed("A", "2")).unwrap();
        routing.append(&typed("B", "3")).unwrap();

        routing.stop();
        routing.stop();
        let built = built.lock();
        assert_eq!(built.len(), 3);
        assert!(built.iter().all(|list| list.stop_count() == 1));
        assert!(routing.append(&typed("A", "late")).is_err());
    }

    #[test]
    fn test_filters_apply_before_routing() {
        let target = Arc::new(ListAppender::new("t"));
        let routing = RoutingAppender::builder("routing")
            .pattern("k")
            .filter(Arc::new(ThresholdFilter::new(LogLevel::Warn)))
            .route(Route::reference(target.clone()).with_key("k"))
            .build()
            .unwrap();
        routing.start();

        routing.append(&LogEntry::new(LogLevel::Info, "quiet")).unwrap();
        routing.append(&LogEntry::new(LogLevel::Error, "loud")).unwrap();
        assert_eq!(target.messages(), vec!["loud".to_string()]);
    }

    #[test]
    fn test_from_node() {
        let (config, built) = capturing_config();
        let audit = Arc::new(ListAppender::new("audit"));
        config.add_appender(audit.clone());

        let node = Node::new("Routing")
            .with_attribute("name", "routing")
            .with_child(
                Node::new("Routes")
                    .with_attribute("pattern", "${ctx:type}")
                    .with_child(Node::new("Route").with_attribute("key", "Audit").with_attribute("ref", "audit"))
                    .with_child(Node::new("Route").with_child(
                        Node::new("Capture").with_attribute("name", "dyn-${ctx:type}"),
                    )),
            )
            .with_child(
                Node::new("IdlePurgePolicy")
                    .with_attribute("timeToLive", "10")
                    .with_attribute("timeUnit", "minutes"),
            )
            .with_child(Node::new("PropertyRewritePolicy").with_attribute("properties", "env=test"));

        let routing = config.create_appender(&node, None).unwrap();
        routing.start();
        routing.append(&typed("Audit", "a")).unwrap();
        routing.append(&typed("Billing", "b")).unwrap();

        assert_eq!(audit.messages(), vec!["a".to_string()]);
        let built = built.lock();
        assert_eq!(built[0].name(), "dyn-Billing");
        assert_eq!(built[0].events()[0].context_map().get("env").map(String::as_str), Some("test"));
        routing.stop();
    }

    #[test]
    fn test_from_node_rejects_unknown_ref() {
        let node = Node::new("Routing").with_attribute("name", "r").with_child(
            Node::new("Routes")
                .with_attribute("pattern", "k")
                .with_child(Node::new("Route").with_attribute("ref", "missing")),
        );
        let err = RoutingAppender::from_node(&node, &Configuration::new()).unwrap_err();
        assert!(matches!(err, LoggerError::UnknownAppender(ref name) if name == "missing"));
    }

    #[test]
    fn test_scripted_resolution_with_static_variables() {
        let even = Arc::new(ListAppender::new("even"));
        let odd = Arc::new(ListAppender::new("odd"));
        let script = FnScript::new("alternate", |b: &ScriptBindings<'_>| {
            let mut count = b.static_variables.entry("count".to_string()).or_insert(json!(0));
            let n = count.as_u64().unwrap_or(0);
            *count = json!(n + 1);
            Ok(json!(if n % 2 == 0 { "even" } else { "odd" }))
        });
        let routing = RoutingAppender::builder("routing")
            .script(Arc::new(script))
            .route(Route::reference(even.clone()).with_key("even"))
            .route(Route::reference(odd.clone()).with_key("odd"))
            .build()
            .unwrap();
        routing.start();

        for i in 0..5 {
            routing.append(&LogEntry::new(LogLevel::Info, format!("m{}", i))).unwrap();
        }
        assert_eq!(even.len(), 3);
        assert_eq!(odd.len(), 2);
        assert_eq!(routing.static_variables().get("count").map(|v| v.clone()), Some(json!(5)));
    }

    #[derive(Default)]
    struct RecordingHandler {
        reports: Mutex<Vec<String>>,
    }

    impl ErrorHandler for RecordingHandler {
        fn error(&self, message: &str) {
            self.reports.lock().push(message.to_string());
        }

        fn error_with_thrown(&self, message: &str, _thrown: &Thrown) {
            self.reports.lock().push(message.to_string());
        }

        fn error_with_event(&self, message: &str, _event: &dyn LogEvent, _thrown: Option<&Thrown>) {
            self.reports.lock().push(message.to_string());
        }
    }

    #[test]
    fn test_failing_resolver_uses_default_or_drops() {
        let fallback = Arc::new(ListAppender::new("fallback"));
        let handler = Arc::new(RecordingHandler::default());
        let panicking = FnScript::new("bad", |_: &ScriptBindings<'_>| -> Result<serde_json::Value> {
            panic!("boom")
        });
        let routing = RoutingAppender::builder("panicking")
            .script(Arc::new(panicking))
            .route(Route::reference(fallback.clone()))
            .error_handler(handler.clone())
            .build()
            .unwrap();
        routing.start();

        assert!(routing.append(&LogEntry::new(LogLevel::Info, "rescued")).is_ok());
        assert_eq!(fallback.messages(), vec!["rescued".to_string()]);
        assert_eq!(routing.metrics().dropped_count(), 0);
        let reports = handler.reports.lock().clone();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].contains("Unable to resolve route key"));
        assert!(reports[0].contains("boom"));
        routing.stop();

        let keyed = Arc::new(ListAppender::new("keyed"));
        let handler = Arc::new(RecordingHandler::default());
        let failing = FnScript::new("failing", |_: &ScriptBindings<'_>| {
            Err(LoggerError::other("no key today"))
        });
        let routing = RoutingAppender::builder("failing")
            .script(Arc::new(failing))
            .route(Route::reference(keyed.clone()).with_key("Service"))
            .error_handler(handler.clone())
            .build()
            .unwrap();
        routing.start();

        assert!(routing.append(&LogEntry::new(LogLevel::Info, "lost")).is_ok());
        assert!(keyed.is_empty());
        assert_eq!(routing.metrics().dropped_count(), 1);
        assert_eq!(handler.reports.lock().len(), 1);
        routing.stop();
    }

    #[test]
    fn test_routing_racing_stop_leaves_nothing_running() {
        let (config, built) = capturing_config();
        let routing = RoutingAppender::builder("racing")
            .configuration(config)
            .pattern("${ctx:type}")
            .route(capture_route())
            .build()
            .unwrap();
        routing.start();
        routing.stop();

        // An event that passed the started check before stop() ran
        routing.route(&typed("Late", "a")).unwrap();
        assert!(built.lock().is_empty());
        assert!(routing.appenders().is_empty());
        assert_eq!(routing.metrics().dropped_count(), 1);

        // A control registered after stop_all() is stopped by the late event
        let straggler = Arc::new(ListAppender::new("straggler"));
        let appender = straggler.clone();
        routing
            .registry
            .get_or_create("Late", move || Ok(AppenderControl::created("Late", appender)))
            .unwrap();
        routing.route(&typed("Late", "b")).unwrap();
        assert_eq!(straggler.stop_count(), 1);
        assert!(routing.appenders().is_empty());
    }
}
