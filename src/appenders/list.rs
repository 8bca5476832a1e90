//! In-memory appender for tests and diagnostics

use crate::core::{
    Appender, FilterSet, Filterable, Layout, LifeCycle, LogEntry, LogEvent, LoggerError, Result,
};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Collects every appended event in memory.
///
/// Besides recording, it can be switched to fail every append or to block
/// appending threads until released, which lets tests drive error paths and
/// slow appenders deterministically.
pub struct ListAppender {
    name: String,
    events: Mutex<Vec<LogEntry>>,
    lines: Mutex<Vec<String>>,
    layout: Option<Arc<dyn Layout>>,
    filters: FilterSet,
    life_cycle: LifeCycle,
    stop_calls: AtomicUsize,
    rejected: AtomicUsize,
    failing: AtomicBool,
    gate: Mutex<bool>,
    gate_changed: Condvar,
    blocked: AtomicUsize,
}

impl ListAppender {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Mutex::new(Vec::new()),
            lines: Mutex::new(Vec::new()),
            layout: None,
            filters: FilterSet::new(),
            life_cycle: LifeCycle::new(),
            stop_calls: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            gate: Mutex::new(false),
            gate_changed: Condvar::new(),
            blocked: AtomicUsize::new(0),
        }
    }

    /// Also keep each event formatted through `layout`, see [`lines`](Self::lines).
    #[must_use]
    pub fn with_layout(mut self, layout: Arc<dyn Layout>) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn events(&self) -> Vec<LogEntry> {
        self.events.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|e| e.message().to_string())
            .collect()
    }

    /// Formatted events; empty unless a layout was set.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
        self.lines.lock().clear();
    }

    /// Number of times `stop()` was called, including repeated calls.
    pub fn stop_count(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    /// Appends refused because the appender was already stopped.
    pub fn rejected_count(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Block every following append until [`release`](Self::release).
    pub fn hang(&self) {
        *self.gate.lock() = true;
    }

    pub fn release(&self) {
        *self.gate.lock() = false;
        self.gate_changed.notify_all();
    }

    /// Threads currently blocked inside `append`.
    pub fn blocked_count(&self) -> usize {
        self.blocked.load(Ordering::SeqCst)
    }

    fn wait_at_gate(&self) {
        let mut closed = self.gate.lock();
        if !*closed {
            return;
        }
        self.blocked.fetch_add(1, Ordering::SeqCst);
        while *closed {
            self.gate_changed.wait(&mut closed);
        }
        self.blocked.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Appender for ListAppender {
    fn append(&self, event: &dyn LogEvent) -> Result<()> {
        if self.life_cycle.state() == crate::core::LifeCycleState::Stopped {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(LoggerError::Stopped(self.name.clone()));
        }
        if self.filters.is_filtered(event) {
            return Ok(());
        }
        self.wait_at_gate();
        if self.failing.load(Ordering::SeqCst) {
            return Err(LoggerError::writer(format!(
                "List appender '{}' is set to fail",
                self.name
            )));
        }
        if let Some(layout) = &self.layout {
            self.lines.lock().push(layout.format(event));
        }
        self.events.lock().push(LogEntry::copy_from(event));
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) {
        self.life_cycle.start();
    }

    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.life_cycle.stop();
    }

    fn is_started(&self) -> bool {
        self.life_cycle.is_started()
    }

    fn filterable(&self) -> Option<&dyn Filterable> {
        Some(&self.filters)
    }

    fn layout(&self) -> Option<Arc<dyn Layout>> {
        self.layout.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, PatternLayout, ThresholdFilter};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_records_events_and_lines() {
        let list = ListAppender::new("list")
            .with_layout(Arc::new(PatternLayout::new("%p:%m").unwrap()));
        list.start();
        list.append(&LogEntry::new(LogLevel::Warn, "one")).unwrap();
        list.append(&LogEntry::new(LogLevel::Info, "two")).unwrap();

        assert_eq!(list.messages(), vec!["one".to_string(), "two".to_string()]);
        assert_eq!(list.lines(), vec!["WARN:one".to_string(), "INFO:two".to_string()]);
        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn test_rejects_after_stop() {
        let list = ListAppender::new("list");
        list.start();
        list.stop();
        list.stop();
        assert!(list.append(&LogEntry::new(LogLevel::Info, "late")).is_err());
        assert_eq!(list.rejected_count(), 1);
        assert_eq!(list.stop_count(), 2);
    }

    #[test]
    fn test_filters_apply() {
        let list = ListAppender::new("list");
        list.filterable()
            .unwrap()
            .add_filter(Arc::new(ThresholdFilter::new(LogLevel::Error)));
        list.append(&LogEntry::new(LogLevel::Info, "dropped")).unwrap();
        list.append(&LogEntry::new(LogLevel::Fatal, "kept")).unwrap();
        assert_eq!(list.messages(), vec!["kept".to_string()]);
    }

    #[test]
    fn test_failing_switch() {
        let list = ListAppender::new("list");
        list.set_failing(true);
        assert!(list.append(&LogEntry::new(LogLevel::Info, "x")).is_err());
        list.set_failing(false);
        assert!(list.append(&LogEntry::new(LogLevel::Info, "y")).is_ok());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_hang_blocks_until_released() {
        let list = Arc::new(ListAppender::new("slow"));
        list.hang();

        let worker = {
            let list = Arc::clone(&list);
            thread::spawn(move || list.append(&LogEntry::new(LogLevel::Info, "slow")))
        };
        while list.blocked_count() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(list.is_empty());

        list.release();
        worker.join().unwrap().unwrap();
        assert_eq!(list.len(), 1);
    }
}
