//! Concurrent registry of route key to appender control
//!
//! Lookups of existing controls only take a shard read lock. Creation is
//! serialized per key: the factory runs under that key's creation lock,
//! outside any map lock, and the map is checked again once the lock is held
//! so a key is never built twice by concurrent callers.

use super::control::{AppendOutcome, AppenderControl};
use super::metrics::RoutingMetrics;
use crate::core::{LogEvent, Result, StatusLogger};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// How often `forward` retries after losing a race against a delete.
pub const FORWARD_ATTEMPTS: usize = 3;

#[derive(Default)]
pub struct AppenderRegistry {
    controls: DashMap<String, Arc<AppenderControl>>,
    creation_locks: DashMap<String, Arc<Mutex<()>>>,
    metrics: Arc<RoutingMetrics>,
}

impl AppenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: Arc<RoutingMetrics>) -> Self {
        Self {
            metrics,
            ..Self::default()
        }
    }

    pub fn metrics(&self) -> &Arc<RoutingMetrics> {
        &self.metrics
    }

    pub fn get(&self, key: &str) -> Option<Arc<AppenderControl>> {
        self.controls.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.controls.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Return the live control for `key`, building it with `create` if absent.
    ///
    /// A failing `create` leaves the key absent, so the next call tries again.
    pub fn get_or_create<F>(&self, key: &str, create: F) -> Result<Arc<AppenderControl>>
    where
        F: FnOnce() -> Result<AppenderControl>,
    {
        if let Some(control) = self.get(key).filter(|c| !c.is_retired()) {
            return Ok(control);
        }

        let lock = self
            .creation_locks
            .entry(key.to_string())
            .or_default()
            .clone();
        let result = {
            let _creating = lock.lock();
            match self.get(key) {
                Some(control) if !control.is_retired() => Ok(control),
                stale => {
                    if let Some(stale) = stale {
                        self.controls.remove_if(key, |_, current| Arc::ptr_eq(current, &stale));
                    }
                    create().map(|control| {
                        let control = Arc::new(control);
                        self.controls.insert(key.to_string(), Arc::clone(&control));
                        control
                    })
                }
            }
        };
        drop(lock);
        // Only the map holds the lock now unless another creator is waiting on it.
        self.creation_locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Look up or create the control for `key` and append `event` to it.
    ///
    /// A control retired between lookup and append is replaced by a fresh
    /// one; after [`FORWARD_ATTEMPTS`] such races the event is dropped.
    pub fn forward<F>(&self, key: &str, event: &dyn LogEvent, create: F) -> Result<AppendOutcome>
    where
        F: Fn() -> Result<AppenderControl>,
    {
        for _ in 0..FORWARD_ATTEMPTS {
            let control = self.get_or_create(key, &create)?;
            control.touch();
            match control.append(event) {
                AppendOutcome::Retired => continue,
                outcome => return Ok(outcome),
            }
        }
        StatusLogger::global().warn(format!(
            "Appender for route '{}' was stopped while forwarding, event dropped",
            key
        ));
        Ok(AppendOutcome::Retired)
    }

    /// Remove and stop the control for `key`.
    ///
    /// Returns false if there was nothing to delete, which makes repeated
    /// deletes harmless.
    pub fn delete(&self, key: &str) -> bool {
        match self.controls.remove(key) {
            Some((_, control)) => {
                if control.request_stop() {
                    self.metrics.record_purged();
                }
                true
            }
            None => false,
        }
    }

    /// Remove and stop `control` only if it is still the one registered for `key`.
    pub fn retire(&self, key: &str, control: &Arc<AppenderControl>) -> bool {
        match self
            .controls
            .remove_if(key, |_, current| Arc::ptr_eq(current, control))
        {
            Some(_) => {
                if control.request_stop() {
                    self.metrics.record_purged();
                }
                true
            }
            None => false,
        }
    }

    /// Point-in-time copy of the registry, safe to iterate while it changes.
    pub fn snapshot(&self) -> HashMap<String, Arc<AppenderControl>> {
        self.controls
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.controls.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Remove and stop every control.
    pub fn stop_all(&self) {
        for key in self.keys() {
            if let Some((_, control)) = self.controls.remove(&key) {
                control.request_stop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::ListAppender;
    use crate::core::{LogEntry, LogLevel, LoggerError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    fn created(key: &str) -> Result<AppenderControl> {
        Ok(AppenderControl::created(key, Arc::new(ListAppender::new(key))))
    }

    #[test]
    fn test_get_or_create_reuses_control() {
        let registry = AppenderRegistry::new();
        let first = registry.get_or_create("a", || created("a")).unwrap();
        let second = registry
            .get_or_create("a", || panic!("must not build twice"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_failed_creation_is_retried() {
        let registry = AppenderRegistry::new();
        let err = registry
            .get_or_create("bad", || Err(LoggerError::construction("bad", "disk full")))
            .unwrap_err();
        assert!(matches!(err, LoggerError::Construction { .. }));
        assert!(!registry.contains("bad"));

        assert!(registry.get_or_create("bad", || created("bad")).is_ok());
        assert!(registry.contains("bad"));
    }

    #[test]
    fn test_concurrent_creation_builds_once() {
        let registry = Arc::new(AppenderRegistry::new());
        let builds = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let builds = Arc::clone(&builds);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry
                        .get_or_create("hot", || {
                            builds.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(std::time::Duration::from_millis(5));
                            created("hot")
                        })
                        .unwrap()
                })
            })
            .collect();

        let controls: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(controls.iter().all(|c| Arc::ptr_eq(c, &controls[0])));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let registry = AppenderRegistry::new();
        let list = Arc::new(ListAppender::new("k"));
        let control_list = list.clone();
        registry
            .get_or_create("k", move || Ok(AppenderControl::created("k", control_list)))
            .unwrap();

        assert!(registry.delete("k"));
        assert!(!registry.delete("k"));
        assert_eq!(list.stop_count(), 1);
        assert_eq!(registry.metrics().purged_count(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_retire_ignores_replaced_control() {
        let registry = AppenderRegistry::new();
        let old = registry.get_or_create("k", || created("k")).unwrap();
        registry.delete("k");
        let fresh = registry.get_or_create("k", || created("k")).unwrap();

        assert!(!registry.retire("k", &old));
        assert!(registry.contains("k"));
        assert!(registry.retire("k", &fresh));
        assert!(!registry.contains("k"));
    }

    #[test]
    fn test_forward_recreates_after_delete() {
        let registry = AppenderRegistry::new();
        let builds = AtomicUsize::new(0);
        let event = LogEntry::new(LogLevel::Info, "m");
        let create = || {
            builds.fetch_add(1, Ordering::SeqCst);
            created("k")
        };

        assert!(matches!(registry.forward("k", &event, create).unwrap(), AppendOutcome::Appended));
        registry.delete("k");
        assert!(matches!(registry.forward("k", &event, create).unwrap(), AppendOutcome::Appended));
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_snapshot_and_stop_all() {
        let registry = AppenderRegistry::new();
        let lists: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|key| {
                let list = Arc::new(ListAppender::new(*key));
                let for_control = list.clone();
                registry
                    .get_or_create(key, move || Ok(AppenderControl::created(*key, for_control)))
                    .unwrap();
                list
            })
            .collect();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 3);

        registry.stop_all();
        assert!(registry.is_empty());
        assert_eq!(snapshot.len(), 3);
        assert!(lists.iter().all(|l| l.stop_count() == 1));
    }
}
