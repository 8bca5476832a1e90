//! Appender adapters

use super::event::{LegacyEventView, ModernEventView};
use super::filter::{FilterAdapter, FilterWrapper};
use super::layout::{LayoutAdapter, LayoutWrapper};
use crate::core::{
    Appender, FilterSet, Filterable, Layout, LifeCycle, LogEvent, LoggerError, Result,
    StatusLogger, Thrown,
};
use crate::legacy::{self, LoggingEvent};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An older-model appender usable as a newer-model one.
pub struct AppenderAdapter {
    appender: Arc<dyn legacy::Appender>,
    name: String,
    life_cycle: LifeCycle,
    filters: FilterSet,
}

impl AppenderAdapter {
    pub fn adapt(appender: Arc<dyn legacy::Appender>) -> Arc<dyn Appender> {
        match appender.modern_view() {
            Some(original) => original,
            None => Arc::new(Self::new(appender)),
        }
    }

    pub fn new(appender: Arc<dyn legacy::Appender>) -> Self {
        Self {
            name: appender.name().to_string(),
            appender,
            life_cycle: LifeCycle::new(),
            filters: FilterSet::new(),
        }
    }

    pub fn inner(&self) -> &Arc<dyn legacy::Appender> {
        &self.appender
    }
}

impl Appender for AppenderAdapter {
    fn append(&self, event: &dyn LogEvent) -> Result<()> {
        if !self.life_cycle.is_started() && !self.life_cycle.start() {
            return Err(LoggerError::Stopped(self.name.clone()));
        }
        if self.filters.is_filtered(event) {
            return Ok(());
        }
        let view = LegacyEventView::of(event);
        self.appender.do_append(&*view);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) {
        self.life_cycle.start();
    }

    fn stop(&self) {
        if self.life_cycle.stop() {
            self.appender.close();
        }
    }

    fn is_started(&self) -> bool {
        self.life_cycle.is_started()
    }

    fn filterable(&self) -> Option<&dyn Filterable> {
        Some(&self.filters)
    }

    fn layout(&self) -> Option<Arc<dyn Layout>> {
        self.appender.layout().map(LayoutAdapter::adapt)
    }

    fn legacy_view(&self) -> Option<Arc<dyn legacy::Appender>> {
        Some(Arc::clone(&self.appender))
    }
}

/// A newer-model appender usable as an older-model one.
///
/// Append failures are reported to the error handler set on the wrapper,
/// or to the status logger when none is set.
pub struct AppenderWrapper {
    appender: Arc<dyn Appender>,
    error_handler: RwLock<Option<Arc<dyn legacy::ErrorHandler>>>,
    closed: AtomicBool,
}

impl AppenderWrapper {
    pub fn wrap(appender: Arc<dyn Appender>) -> Arc<dyn legacy::Appender> {
        match appender.legacy_view() {
            Some(original) => original,
            None => Arc::new(Self::new(appender)),
        }
    }

    pub fn new(appender: Arc<dyn Appender>) -> Self {
        Self {
            appender,
            error_handler: RwLock::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &Arc<dyn Appender> {
        &self.appender
    }
}

impl legacy::Appender for AppenderWrapper {
    fn do_append(&self, event: &dyn LoggingEvent) {
        let view = ModernEventView::of(event);
        if let Err(error) = self.appender.append(&*view) {
            let message = format!("Failed to append to {}", self.appender.name());
            match self.error_handler.read().as_ref() {
                Some(handler) => handler.error_with(
                    &message,
                    Some(&Thrown::from_error(&error)),
                    legacy::error_handler::WRITE_FAILURE,
                    Some(event),
                ),
                None => StatusLogger::global().error_with_cause(message, &error),
            }
        }
    }

    fn name(&self) -> &str {
        self.appender.name()
    }

    fn add_filter(&self, filter: Arc<dyn legacy::Filter>) {
        match self.appender.filterable() {
            Some(filterable) => filterable.add_filter(FilterAdapter::adapt(filter)),
            None => StatusLogger::global().warn(format!(
                "Unable to add filter to appender {}, it does not support filters",
                self.appender.name()
            )),
        }
    }

    fn filter(&self) -> Option<Arc<dyn legacy::Filter>> {
        self.appender
            .filterable()
            .and_then(|filterable| filterable.filter())
            .map(FilterWrapper::wrap)
    }

    fn clear_filters(&self) {
        if let Some(filterable) = self.appender.filterable() {
            filterable.clear_filters();
        }
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.appender.stop();
        }
    }

    fn error_handler(&self) -> Option<Arc<dyn legacy::ErrorHandler>> {
        self.error_handler.read().clone()
    }

    fn set_error_handler(&self, handler: Arc<dyn legacy::ErrorHandler>) {
        *self.error_handler.write() = Some(handler);
    }

    fn layout(&self) -> Option<Arc<dyn legacy::Layout>> {
        self.appender.layout().map(LayoutWrapper::wrap)
    }

    fn set_layout(&self, _layout: Arc<dyn legacy::Layout>) {
        StatusLogger::global().warn(format!(
            "Unable to set layout on appender {}, its layout is fixed at construction",
            self.appender.name()
        ));
    }

    fn requires_layout(&self) -> bool {
        false
    }

    fn modern_view(&self) -> Option<Arc<dyn Appender>> {
        Some(Arc::clone(&self.appender))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::ListAppender;
    use crate::core::{LogEntry, LogLevel, ThresholdFilter};
    use crate::legacy::{Level, LegacyEvent, LevelMatchFilter, VectorAppender};

    struct Bare {
        name: String,
    }

    impl Appender for Bare {
        fn append(&self, _event: &dyn LogEvent) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn test_adapter_stop_closes_once() {
        let vector = Arc::new(VectorAppender::new("vector"));
        let adapted = AppenderAdapter::adapt(vector.clone());
        adapted.start();
        adapted
            .append(&LogEntry::new(LogLevel::Info, "one"))
            .expect("append");

        adapted.stop();
        adapted.stop();
        assert_eq!(vector.close_count(), 1);
        assert_eq!(vector.lines(), vec!["one".to_string()]);
        assert!(adapted.append(&LogEntry::new(LogLevel::Info, "late")).is_err());
    }

    #[test]
    fn test_adapter_filters_before_delegating() {
        let vector = Arc::new(VectorAppender::new("vector"));
        let adapted = AppenderAdapter::adapt(vector.clone());
        adapted
            .filterable()
            .expect("adapter is filterable")
            .add_filter(Arc::new(ThresholdFilter::new(LogLevel::Warn)));

        adapted.append(&LogEntry::new(LogLevel::Info, "quiet")).expect("append");
        adapted.append(&LogEntry::new(LogLevel::Error, "loud")).expect("append");
        assert_eq!(vector.lines(), vec!["loud".to_string()]);
    }

    #[test]
    fn test_wrapper_forwards_and_attaches_filters() {
        let list = Arc::new(ListAppender::new("list"));
        let wrapped = AppenderWrapper::wrap(list.clone());
        wrapped.add_filter(Arc::new(LevelMatchFilter::new(Level::DEBUG, false)));

        wrapped.do_append(&LegacyEvent::new("x", Level::DEBUG, "denied"));
        wrapped.do_append(&LegacyEvent::new("x", Level::INFO, "kept"));
        assert_eq!(list.messages(), vec!["kept".to_string()]);
        assert!(wrapped.filter().is_some());

        wrapped.clear_filters();
        assert!(wrapped.filter().is_none());
    }

    #[test]
    fn test_wrapper_degrades_for_unfilterable_appender() {
        let wrapped = AppenderWrapper::wrap(Arc::new(Bare {
            name: "bare-filter-probe".into(),
        }));
        wrapped.add_filter(Arc::new(LevelMatchFilter::new(Level::DEBUG, false)));
        assert!(wrapped.filter().is_none());
        assert_eq!(
            StatusLogger::global()
                .entries_matching("appender bare-filter-probe, it does not support filters")
                .len(),
            1
        );
    }

    #[test]
    fn test_wrapper_close_stops_once() {
        let list = Arc::new(ListAppender::new("list"));
        list.start();
        let wrapped = AppenderWrapper::wrap(list.clone());
        wrapped.close();
        wrapped.close();
        assert_eq!(list.stop_count(), 1);
    }

    #[test]
    fn test_round_trips_return_original() {
        let vector: Arc<dyn legacy::Appender> = Arc::new(VectorAppender::new("vector"));
        let back = AppenderWrapper::wrap(AppenderAdapter::adapt(Arc::clone(&vector)));
        assert!(Arc::ptr_eq(&back, &vector));

        let list: Arc<dyn Appender> = Arc::new(ListAppender::new("list"));
        let back = AppenderAdapter::adapt(AppenderWrapper::wrap(Arc::clone(&list)));
        assert!(Arc::ptr_eq(&back, &list));
    }
}
