//! Filters deciding whether an event is processed

use super::log_entry::LogEvent;
use super::log_level::LogLevel;
use crate::legacy;
use std::str::FromStr;
use std::sync::Arc;

/// The result of a filter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterResult {
    /// The event will be processed without further filtering.
    Accept,
    /// The event should not be processed.
    Deny,
    /// No decision could be made, further filtering should occur.
    Neutral,
}

impl FromStr for FilterResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ACCEPT" => Ok(FilterResult::Accept),
            "DENY" => Ok(FilterResult::Deny),
            "NEUTRAL" => Ok(FilterResult::Neutral),
            _ => Err(format!("Invalid filter result: '{}'", s)),
        }
    }
}

pub trait Filter: Send + Sync {
    fn filter(&self, event: &dyn LogEvent) -> FilterResult;

    /// The older-model filter this value wraps, if any.
    fn legacy_view(&self) -> Option<Arc<dyn legacy::Filter>> {
        None
    }
}

/// Ordered filters where the first `Accept` or `Deny` wins.
#[derive(Clone, Default)]
pub struct CompositeFilter {
    filters: Vec<Arc<dyn Filter>>,
}

impl CompositeFilter {
    pub fn new(filters: Vec<Arc<dyn Filter>>) -> Self {
        Self { filters }
    }

    #[must_use]
    pub fn with(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(&self) -> &[Arc<dyn Filter>] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Filter for CompositeFilter {
    fn filter(&self, event: &dyn LogEvent) -> FilterResult {
        for filter in &self.filters {
            match filter.filter(event) {
                FilterResult::Neutral => continue,
                decided => return decided,
            }
        }
        FilterResult::Neutral
    }
}

/// Matches events at or above a severity level.
#[derive(Debug, Clone)]
pub struct ThresholdFilter {
    level: LogLevel,
    on_match: FilterResult,
    on_mismatch: FilterResult,
}

impl ThresholdFilter {
    /// Events at `level` or more severe are neutral, the rest denied.
    pub fn new(level: LogLevel) -> Self {
        Self::with_results(level, FilterResult::Neutral, FilterResult::Deny)
    }

    pub fn with_results(level: LogLevel, on_match: FilterResult, on_mismatch: FilterResult) -> Self {
        Self {
            level,
            on_match,
            on_mismatch,
        }
    }
}

impl Filter for ThresholdFilter {
    fn filter(&self, event: &dyn LogEvent) -> FilterResult {
        if event.level().is_more_specific_than(self.level) {
            self.on_match
        } else {
            self.on_mismatch
        }
    }
}

/// Matches events whose marker is, or descends from, a named marker.
#[derive(Debug, Clone)]
pub struct MarkerFilter {
    name: String,
    on_match: FilterResult,
    on_mismatch: FilterResult,
}

impl MarkerFilter {
    pub fn new(name: impl Into<String>, on_match: FilterResult, on_mismatch: FilterResult) -> Self {
        Self {
            name: name.into(),
            on_match,
            on_mismatch,
        }
    }
}

impl Filter for MarkerFilter {
    fn filter(&self, event: &dyn LogEvent) -> FilterResult {
        match event.marker() {
            Some(marker) if marker.is_instance_of(&self.name) => self.on_match,
            _ => self.on_mismatch,
        }
    }
}
