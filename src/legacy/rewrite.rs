//! Rewrite policies of the older model

use super::event::{LegacyEvent, LoggingEvent};
use std::sync::Arc;

pub trait RewritePolicy: Send + Sync {
    /// Returns the replacement event, or `None` to keep `source`.
    fn rewrite(&self, source: &dyn LoggingEvent) -> Option<LegacyEvent>;

    /// The newer-model policy this value wraps, if any.
    fn modern_view(&self) -> Option<Arc<dyn crate::core::RewritePolicy>> {
        None
    }
}

/// Adds properties that the event does not already carry.
#[derive(Debug, Clone, Default)]
pub struct PropertyRewritePolicy {
    properties: Vec<(String, String)>,
}

impl PropertyRewritePolicy {
    pub fn new(properties: Vec<(String, String)>) -> Self {
        Self { properties }
    }

    /// Parse `key1=value1,key2=value2`.
    pub fn parse(properties: &str) -> Self {
        let properties = properties
            .split(',')
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=')?;
                let key = key.trim();
                (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
            })
            .collect();
        Self { properties }
    }
}

impl RewritePolicy for PropertyRewritePolicy {
    fn rewrite(&self, source: &dyn LoggingEvent) -> Option<LegacyEvent> {
        let missing: Vec<_> = self
            .properties
            .iter()
            .filter(|(key, _)| !source.properties().contains_key(key))
            .collect();
        if missing.is_empty() {
            return None;
        }
        let rewritten = missing
            .into_iter()
            .fold(LegacyEvent::copy_from(source), |event, (key, value)| {
                event.with_property(key.clone(), value.clone())
            });
        Some(rewritten)
    }
}
