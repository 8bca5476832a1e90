//! Appender trait for log output destinations

use super::error::Result;
use super::filter::{CompositeFilter, Filter, FilterResult};
use super::layout::Layout;
use super::log_entry::LogEvent;
use crate::legacy;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// A destination for events.
///
/// Appenders are shared between threads, so every method takes `&self`;
/// implementations keep their mutable state behind locks or atomics.
pub trait Appender: Send + Sync {
    fn append(&self, event: &dyn LogEvent) -> Result<()>;

    fn name(&self) -> &str;

    fn start(&self) {}

    /// Release resources. Must be safe to call more than once.
    fn stop(&self) {}

    fn is_started(&self) -> bool {
        true
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Filter attachment, for appenders that support it.
    fn filterable(&self) -> Option<&dyn Filterable> {
        None
    }

    fn layout(&self) -> Option<Arc<dyn Layout>> {
        None
    }

    /// The older-model appender this value wraps, if any.
    fn legacy_view(&self) -> Option<Arc<dyn legacy::Appender>> {
        None
    }
}

/// Optional capability of appenders that accept filters.
pub trait Filterable: Send + Sync {
    fn add_filter(&self, filter: Arc<dyn Filter>);

    /// Returns true if the filter was attached.
    fn remove_filter(&self, filter: &Arc<dyn Filter>) -> bool;

    fn clear_filters(&self);

    /// The attached filters as one composite, if any are attached.
    fn filter(&self) -> Option<Arc<dyn Filter>>;

    /// True when the attached filters deny the event.
    fn is_filtered(&self, event: &dyn LogEvent) -> bool {
        self.filter()
            .is_some_and(|filter| filter.filter(event) == FilterResult::Deny)
    }
}

/// Thread-safe filter list usable as an appender's [`Filterable`] capability.
#[derive(Default)]
pub struct FilterSet {
    filters: RwLock<Vec<Arc<dyn Filter>>>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Filterable for FilterSet {
    fn add_filter(&self, filter: Arc<dyn Filter>) {
        self.filters.write().push(filter);
    }

    fn remove_filter(&self, filter: &Arc<dyn Filter>) -> bool {
        let mut filters = self.filters.write();
        let before = filters.len();
        filters.retain(|existing| !Arc::ptr_eq(existing, filter));
        filters.len() != before
    }

    fn clear_filters(&self) {
        self.filters.write().clear();
    }

    fn filter(&self) -> Option<Arc<dyn Filter>> {
        let filters = self.filters.read();
        match filters.len() {
            0 => None,
            1 => Some(Arc::clone(&filters[0])),
            _ => Some(Arc::new(CompositeFilter::new(filters.clone()))),
        }
    }

    fn is_filtered(&self, event: &dyn LogEvent) -> bool {
        for filter in self.filters.read().iter() {
            match filter.filter(event) {
                FilterResult::Neutral => continue,
                decided => return decided == FilterResult::Deny,
            }
        }
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeCycleState {
    Initialized,
    Started,
    Stopped,
}

/// Start/stop bookkeeping shared by appenders.
///
/// `stop()` reports `true` to exactly one caller, which then owns teardown.
#[derive(Debug)]
pub struct LifeCycle {
    state: AtomicU8,
}

impl LifeCycle {
    const INITIALIZED: u8 = 0;
    const STARTED: u8 = 1;
    const STOPPED: u8 = 2;

    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(Self::INITIALIZED),
        }
    }

    /// Returns true if this call moved the state to started.
    pub fn start(&self) -> bool {
        self.state
            .compare_exchange(Self::INITIALIZED, Self::STARTED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Returns true for the single caller that performs the stop.
    pub fn stop(&self) -> bool {
        self.state.swap(Self::STOPPED, Ordering::AcqRel) != Self::STOPPED
    }

    pub fn is_started(&self) -> bool {
        self.state.load(Ordering::Acquire) == Self::STARTED
    }

    pub fn state(&self) -> LifeCycleState {
        match self.state.load(Ordering::Acquire) {
            Self::INITIALIZED => LifeCycleState::Initialized,
            Self::STARTED => LifeCycleState::Started,
            _ => LifeCycleState::Stopped,
        }
    }
}

impl Default for LifeCycle {
    fn default() -> Self {
        Self::new()
    }
}
