//! Appenders of the older model

use super::error_handler::{ErrorHandler, OnlyOnceErrorHandler};
use super::event::LoggingEvent;
use super::filter::{decide_chain, Decision, Filter, FilterChain};
use super::layout::Layout;
use super::level::Level;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// An older-model destination. Failures are reported to the appender's
/// error handler, never returned.
pub trait Appender: Send + Sync {
    fn do_append(&self, event: &dyn LoggingEvent);

    fn name(&self) -> &str;

    fn add_filter(&self, filter: Arc<dyn Filter>);

    /// Head of the filter chain.
    fn filter(&self) -> Option<Arc<dyn Filter>>;

    fn clear_filters(&self);

    /// Release resources. Later appends are rejected.
    fn close(&self);

    fn error_handler(&self) -> Option<Arc<dyn ErrorHandler>>;

    fn set_error_handler(&self, handler: Arc<dyn ErrorHandler>);

    fn layout(&self) -> Option<Arc<dyn Layout>>;

    fn set_layout(&self, layout: Arc<dyn Layout>);

    fn requires_layout(&self) -> bool;

    /// The newer-model appender this value wraps, if any.
    fn modern_view(&self) -> Option<Arc<dyn crate::core::Appender>> {
        None
    }
}

/// Shared state of older-model appenders: threshold, filter chain, layout,
/// error handler and the closed flag.
pub struct AppenderSkeleton {
    name: String,
    threshold: RwLock<Level>,
    filters: RwLock<FilterChain>,
    head: RwLock<Option<Arc<dyn Filter>>>,
    layout: RwLock<Option<Arc<dyn Layout>>>,
    error_handler: RwLock<Arc<dyn ErrorHandler>>,
    closed: AtomicBool,
}

impl AppenderSkeleton {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            threshold: RwLock::new(Level::ALL),
            filters: RwLock::new(FilterChain::new()),
            head: RwLock::new(None),
            layout: RwLock::new(None),
            error_handler: RwLock::new(Arc::new(OnlyOnceErrorHandler::new())),
            closed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_threshold(&self, level: Level) {
        *self.threshold.write() = level;
    }

    pub fn threshold(&self) -> Level {
        self.threshold.read().clone()
    }

    pub fn is_as_severe_as_threshold(&self, level: &Level) -> bool {
        level.is_greater_or_equal(&self.threshold.read())
    }

    pub fn add_filter(&self, filter: Arc<dyn Filter>) {
        let mut filters = self.filters.write();
        let chain = std::mem::take(&mut *filters).then(filter);
        *self.head.write() = chain.build();
        *filters = chain;
    }

    pub fn filter(&self) -> Option<Arc<dyn Filter>> {
        self.head.read().clone()
    }

    pub fn clear_filters(&self) {
        *self.filters.write() = FilterChain::new();
        *self.head.write() = None;
    }

    pub fn layout(&self) -> Option<Arc<dyn Layout>> {
        self.layout.read().clone()
    }

    pub fn set_layout(&self, layout: Arc<dyn Layout>) {
        *self.layout.write() = Some(layout);
    }

    pub fn error_handler(&self) -> Arc<dyn ErrorHandler> {
        Arc::clone(&self.error_handler.read())
    }

    pub fn set_error_handler(&self, handler: Arc<dyn ErrorHandler>) {
        *self.error_handler.write() = handler;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Marks the appender closed; true for the first caller only.
    pub fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    /// Threshold, closed-state and filter-chain checks run before appending.
    pub fn should_append(&self, event: &dyn LoggingEvent) -> bool {
        if self.is_closed() {
            self.error_handler().error(&format!(
                "Attempted to append to closed appender named [{}].",
                self.name
            ));
            return false;
        }
        if !self.is_as_severe_as_threshold(event.level()) {
            return false;
        }
        match self.filter() {
            Some(head) => decide_chain(&head, event) != Decision::Deny,
            None => true,
        }
    }
}

/// Keeps every appended event in memory.
pub struct VectorAppender {
    skeleton: AppenderSkeleton,
    lines: Mutex<Vec<String>>,
    close_count: AtomicUsize,
}

impl VectorAppender {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            skeleton: AppenderSkeleton::new(name),
            lines: Mutex::new(Vec::new()),
            close_count: AtomicUsize::new(0),
        }
    }

    pub fn skeleton(&self) -> &AppenderSkeleton {
        &self.skeleton
    }

    /// Appended events, formatted by the layout when one is set.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::Acquire)
    }
}

impl Appender for VectorAppender {
    fn do_append(&self, event: &dyn LoggingEvent) {
        if !self.skeleton.should_append(event) {
            return;
        }
        let line = match self.skeleton.layout() {
            Some(layout) => layout.format(event),
            None => event.rendered_message().to_string(),
        };
        self.lines.lock().push(line);
    }

    fn name(&self) -> &str {
        self.skeleton.name()
    }

    fn add_filter(&self, filter: Arc<dyn Filter>) {
        self.skeleton.add_filter(filter);
    }

    fn filter(&self) -> Option<Arc<dyn Filter>> {
        self.skeleton.filter()
    }

    fn clear_filters(&self) {
        self.skeleton.clear_filters();
    }

    fn close(&self) {
        self.close_count.fetch_add(1, Ordering::AcqRel);
        self.skeleton.mark_closed();
    }

    fn error_handler(&self) -> Option<Arc<dyn ErrorHandler>> {
        Some(self.skeleton.error_handler())
    }

    fn set_error_handler(&self, handler: Arc<dyn ErrorHandler>) {
        self.skeleton.set_error_handler(handler);
    }

    fn layout(&self) -> Option<Arc<dyn Layout>> {
        self.skeleton.layout()
    }

    fn set_layout(&self, layout: Arc<dyn Layout>) {
        self.skeleton.set_layout(layout);
    }

    fn requires_layout(&self) -> bool {
        false
    }
}
