//! Policies rewriting events before they are routed

use super::log_entry::{LogEntry, LogEvent};
use crate::legacy;
use std::str::FromStr;
use std::sync::Arc;

pub trait RewritePolicy: Send + Sync {
    /// Returns the replacement event, or `None` to keep `source` as is.
    fn rewrite(&self, source: &dyn LogEvent) -> Option<LogEntry>;

    /// The older-model policy this value wraps, if any.
    fn legacy_view(&self) -> Option<Arc<dyn legacy::RewritePolicy>> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapRewriteMode {
    /// Insert every pair, overwriting existing values.
    Add,
    /// Only replace values for keys already present.
    Update,
}

impl FromStr for MapRewriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" => Ok(MapRewriteMode::Add),
            "update" => Ok(MapRewriteMode::Update),
            _ => Err(format!("Invalid rewrite mode: '{}'", s)),
        }
    }
}

/// Adds or updates context map entries.
#[derive(Debug, Clone)]
pub struct MapRewritePolicy {
    mode: MapRewriteMode,
    pairs: Vec<(String, String)>,
}

impl MapRewritePolicy {
    pub fn new(mode: MapRewriteMode, pairs: Vec<(String, String)>) -> Self {
        Self { mode, pairs }
    }
}

impl RewritePolicy for MapRewritePolicy {
    fn rewrite(&self, source: &dyn LogEvent) -> Option<LogEntry> {
        let mut map = source.context_map().clone();
        let mut changed = false;
        for (key, value) in &self.pairs {
            if self.mode == MapRewriteMode::Update && !map.contains_key(key) {
                continue;
            }
            if map.get(key) != Some(value) {
                map.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        changed.then(|| LogEntry::copy_from(source).with_context_map(map))
    }
}
