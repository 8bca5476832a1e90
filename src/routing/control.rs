//! Per-key appender control
//!
//! An [`AppenderControl`] wraps the appender serving one route key. It
//! counts appends in flight so that a stop requested while events are being
//! delivered is carried out by the last of them, which gives two guarantees
//! under any interleaving of forwarding, purging and deleting: the appender
//! is stopped at most once, and no event reaches it after it was stopped.

use crate::core::{Appender, LogEvent, LoggerError, StatusLogger, Thrown};
use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const STOPPING: usize = 1 << (usize::BITS - 1);

thread_local! {
    // Controls the current thread is appending through
    static APPENDING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Result of handing one event to a control.
#[derive(Debug)]
pub enum AppendOutcome {
    Appended,
    /// The appender returned an error or panicked
    Failed(LoggerError),
    /// The appender was already being appended to on this thread
    Recursive,
    /// The control was retired before the event got in
    Retired,
}

pub struct AppenderControl {
    key: String,
    appender: Arc<dyn Appender>,
    owned: bool,
    state: AtomicUsize,
    stopped: AtomicBool,
    created_at: Instant,
    last_active_ms: AtomicU64,
}

impl AppenderControl {
    /// Control for an appender built for this route; stopping the control stops it.
    pub fn created(key: impl Into<String>, appender: Arc<dyn Appender>) -> Self {
        Self::new(key.into(), appender, true)
    }

    /// Control for an appender owned by the configuration; it is never stopped here.
    pub fn referenced(key: impl Into<String>, appender: Arc<dyn Appender>) -> Self {
        Self::new(key.into(), appender, false)
    }

    fn new(key: String, appender: Arc<dyn Appender>, owned: bool) -> Self {
        Self {
            key,
            appender,
            owned,
            state: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
            created_at: Instant::now(),
            last_active_ms: AtomicU64::new(0),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn appender(&self) -> &Arc<dyn Appender> {
        &self.appender
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// A stop was requested; no further event will be accepted.
    pub fn is_retired(&self) -> bool {
        self.state.load(Ordering::Acquire) & STOPPING != 0
    }

    /// The stop has been carried out.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn in_flight(&self) -> usize {
        self.state.load(Ordering::Acquire) & !STOPPING
    }

    /// Mark the control as used now.
    pub fn touch(&self) {
        let elapsed = self.created_at.elapsed().as_millis() as u64;
        self.last_active_ms.fetch_max(elapsed, Ordering::AcqRel);
    }

    pub fn last_active(&self) -> Instant {
        self.created_at + Duration::from_millis(self.last_active_ms.load(Ordering::Acquire))
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_active())
    }

    /// Deliver `event` unless the control is retired.
    pub fn append(&self, event: &dyn LogEvent) -> AppendOutcome {
        let Some(_flight) = self.enter() else {
            return AppendOutcome::Retired;
        };
        let Some(_recursion) = RecursionGuard::enter(self) else {
            StatusLogger::global().warn(format!(
                "Recursive call to appender '{}' for route '{}', event dropped",
                self.appender.name(),
                self.key
            ));
            return AppendOutcome::Recursive;
        };

        match catch_unwind(AssertUnwindSafe(|| self.appender.append(event))) {
            Ok(Ok(())) => AppendOutcome::Appended,
            Ok(Err(e)) => AppendOutcome::Failed(e),
            Err(panic) => {
                let thrown = Thrown::from_panic(panic.as_ref());
                AppendOutcome::Failed(LoggerError::other(format!(
                    "Appender '{}' panicked: {}",
                    self.appender.name(),
                    thrown.message().unwrap_or("Unknown panic")
                )))
            }
        }
    }

    /// Retire the control and stop its appender once nothing is in flight.
    ///
    /// Returns true for the one caller whose request retired the control.
    pub fn request_stop(&self) -> bool {
        let previous = self.state.fetch_or(STOPPING, Ordering::AcqRel);
        if previous & STOPPING != 0 {
            return false;
        }
        if previous == 0 {
            self.perform_stop();
        }
        true
    }

    fn enter(&self) -> Option<InFlight<'_>> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current & STOPPING != 0 {
                return None;
            }
            match self.state.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(InFlight { control: self }),
                Err(actual) => current = actual,
            }
        }
    }

    fn perform_stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) || !self.owned {
            return;
        }
        if catch_unwind(AssertUnwindSafe(|| self.appender.stop())).is_err() {
            StatusLogger::global().error(format!(
                "Appender '{}' panicked while stopping",
                self.appender.name()
            ));
        }
    }
}

impl std::fmt::Debug for AppenderControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppenderControl")
            .field("key", &self.key)
            .field("appender", &self.appender.name())
            .field("owned", &self.owned)
            .field("in_flight", &self.in_flight())
            .field("retired", &self.is_retired())
            .finish()
    }
}

struct InFlight<'a> {
    control: &'a AppenderControl,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let previous = self.control.state.fetch_sub(1, Ordering::AcqRel);
        if previous == STOPPING | 1 {
            self.control.perform_stop();
        }
    }
}

struct RecursionGuard {
    id: usize,
}

impl RecursionGuard {
    fn enter(control: &AppenderControl) -> Option<Self> {
        let id = control as *const AppenderControl as usize;
        APPENDING.with(|active| {
            let mut active = active.borrow_mut();
            if active.contains(&id) {
                None
            } else {
                active.push(id);
                Some(Self { id })
            }
        })
    }
}

impl Drop for RecursionGuard {
    fn drop(&mut self) {
        APPENDING.with(|active| active.borrow_mut().retain(|&id| id != self.id));
    }
}
