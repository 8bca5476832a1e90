//! Purge policies evicting route appenders
//!
//! A policy is told about every forwarded event through [`PurgePolicy::update`]
//! and decides when a route's appender is removed from the registry. Eviction
//! always goes through the registry, so a policy racing a manual delete can
//! never stop an appender twice.

use super::registry::AppenderRegistry;
use crate::config::Node;
use crate::core::{LogEvent, LoggerError, Result, StatusLogger};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use dashmap::{DashMap, DashSet};
use parking_lot::{Mutex, RwLock};
use std::str::FromStr;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub trait PurgePolicy: Send + Sync {
    /// Bind the policy to the registry it evicts from. Called once at start.
    fn initialize(&self, registry: &Arc<AppenderRegistry>);

    /// Record that `key` just received `event`.
    fn update(&self, key: &str, event: &dyn LogEvent);

    /// Evict what the policy considers expired, now.
    fn purge(&self);

    /// Release background resources. Called after the registry was stopped.
    fn stop(&self) {}
}

/// Time unit names accepted by the `timeUnit` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub fn duration(self, amount: u64) -> Duration {
        match self {
            TimeUnit::Nanoseconds => Duration::from_nanos(amount),
            TimeUnit::Microseconds => Duration::from_micros(amount),
            TimeUnit::Milliseconds => Duration::from_millis(amount),
            TimeUnit::Seconds => Duration::from_secs(amount),
            TimeUnit::Minutes => Duration::from_secs(amount.saturating_mul(60)),
            TimeUnit::Hours => Duration::from_secs(amount.saturating_mul(3_600)),
            TimeUnit::Days => Duration::from_secs(amount.saturating_mul(86_400)),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NANOSECONDS" | "NS" => Ok(TimeUnit::Nanoseconds),
            "MICROSECONDS" | "US" => Ok(TimeUnit::Microseconds),
            "MILLISECONDS" | "MS" => Ok(TimeUnit::Milliseconds),
            "SECONDS" | "S" => Ok(TimeUnit::Seconds),
            "MINUTES" | "M" => Ok(TimeUnit::Minutes),
            "HOURS" | "H" => Ok(TimeUnit::Hours),
            "DAYS" | "D" => Ok(TimeUnit::Days),
            _ => Err(format!("Invalid time unit: '{}'", s)),
        }
    }
}

struct Sweeper {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

/// Evicts route appenders that received no event for `time_to_live`.
///
/// One background thread per policy wakes up every `check_interval` and
/// sweeps. The thread holds only a weak reference to the registry and exits
/// on its own once the registry is gone.
pub struct IdlePurgePolicy {
    time_to_live: Duration,
    check_interval: Duration,
    last_access: Arc<DashMap<String, Instant>>,
    registry: RwLock<Weak<AppenderRegistry>>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl IdlePurgePolicy {
    pub fn new(time_to_live: Duration, check_interval: Duration) -> Self {
        Self {
            time_to_live,
            check_interval,
            last_access: Arc::new(DashMap::new()),
            registry: RwLock::new(Weak::new()),
            sweeper: Mutex::new(None),
        }
    }

    /// Build from an `IdlePurgePolicy` node.
    ///
    /// `timeToLive` is required; `checkInterval` defaults to it and
    /// `timeUnit` defaults to minutes.
    pub fn from_node(node: &Node) -> Result<Self> {
        let unit = node
            .parse_attribute::<TimeUnit>("timeUnit")?
            .unwrap_or(TimeUnit::Minutes);
        let ttl = node.parse_attribute::<u64>("timeToLive")?.ok_or_else(|| {
            LoggerError::config("IdlePurgePolicy", "timeToLive attribute is required")
        })?;
        if ttl == 0 {
            return Err(LoggerError::config("IdlePurgePolicy", "timeToLive must be positive"));
        }
        let check = node.parse_attribute::<u64>("checkInterval")?.unwrap_or(ttl).max(1);
        Ok(Self::new(unit.duration(ttl), unit.duration(check)))
    }

    pub fn time_to_live(&self) -> Duration {
        self.time_to_live
    }

    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Keys currently tracked as active.
    pub fn tracked_keys(&self) -> Vec<String> {
        self.last_access.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn is_running(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    fn spawn_sweeper(&self, registry: Weak<AppenderRegistry>) -> Option<Sweeper> {
        let (shutdown, signal) = bounded::<()>(1);
        let last_access = Arc::clone(&self.last_access);
        let ttl = self.time_to_live;
        let interval = self.check_interval;

        let spawned = thread::Builder::new()
            .name("routing-idle-purge".to_string())
            .spawn(move || loop {
                match signal.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let Some(registry) = registry.upgrade() else {
                            break;
                        };
                        sweep(&registry, &last_access, ttl);
                    }
                    // Shutdown requested or the policy was dropped
                    _ => break,
                }
            });

        match spawned {
            Ok(handle) => Some(Sweeper { shutdown, handle }),
            Err(e) => {
                StatusLogger::global()
                    .error_with_cause("Unable to start idle purge thread, idle appenders will not be purged", &e);
                None
            }
        }
    }
}

impl PurgePolicy for IdlePurgePolicy {
    fn initialize(&self, registry: &Arc<AppenderRegistry>) {
        *self.registry.write() = Arc::downgrade(registry);
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_none() {
            *sweeper = self.spawn_sweeper(Arc::downgrade(registry));
        }
    }

    fn update(&self, key: &str, _event: &dyn LogEvent) {
        let now = Instant::now();
        match self.last_access.get_mut(key) {
            Some(mut at) => *at = now,
            None => {
                self.last_access.insert(key.to_string(), now);
            }
        }
    }

    fn purge(&self) {
        if let Some(registry) = self.registry.read().upgrade() {
            sweep(&registry, &self.last_access, self.time_to_live);
        }
    }

    fn stop(&self) {
        let Some(sweeper) = self.sweeper.lock().take() else {
            return;
        };
        // A send failure only means the thread already exited
        let _ = sweeper.shutdown.send(());
        if sweeper.handle.thread().id() != thread::current().id() && sweeper.handle.join().is_err() {
            StatusLogger::global().error("Idle purge thread panicked");
        }
    }
}

impl Drop for IdlePurgePolicy {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for IdlePurgePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdlePurgePolicy")
            .field("time_to_live", &self.time_to_live)
            .field("check_interval", &self.check_interval)
            .field("tracked", &self.last_access.len())
            .finish()
    }
}

/// Snapshot the expired keys, then re-check each one before retiring it.
fn sweep(registry: &AppenderRegistry, last_access: &DashMap<String, Instant>, ttl: Duration) -> usize {
    let now = Instant::now();
    let expired: Vec<String> = last_access
        .iter()
        .filter(|entry| now.saturating_duration_since(*entry.value()) >= ttl)
        .map(|entry| entry.key().clone())
        .collect();

    let mut purged = 0;
    for key in expired {
        // An update since the snapshot keeps the key alive
        if last_access
            .remove_if(&key, |_, at| now.saturating_duration_since(*at) >= ttl)
            .is_none()
        {
            continue;
        }
        let Some(control) = registry.get(&key) else {
            continue;
        };
        if control.idle_for(now) < ttl {
            // Still busy with an event that has not returned yet
            last_access.entry(key).or_insert(control.last_active());
            continue;
        }
        if registry.retire(&key, &control) {
            StatusLogger::global().debug(format!("Purged idle appender for route '{}'", key));
            purged += 1;
        }
    }
    purged
}

/// Evicts route appenders only when [`PurgePolicy::purge`] is called.
#[derive(Default)]
pub struct ManualPurgePolicy {
    keys: DashSet<String>,
    registry: RwLock<Weak<AppenderRegistry>>,
}

impl ManualPurgePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.iter().map(|key| key.clone()).collect()
    }
}

impl PurgePolicy for ManualPurgePolicy {
    fn initialize(&self, registry: &Arc<AppenderRegistry>) {
        *self.registry.write() = Arc::downgrade(registry);
    }

    fn update(&self, key: &str, _event: &dyn LogEvent) {
        if !self.keys.contains(key) {
            self.keys.insert(key.to_string());
        }
    }

    fn purge(&self) {
        let Some(registry) = self.registry.read().upgrade() else {
            return;
        };
        for key in self.keys() {
            self.keys.remove(&key);
            registry.delete(&key);
        }
    }
}

impl std::fmt::Debug for ManualPurgePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualPurgePolicy")
            .field("tracked", &self.keys.len())
            .finish()
    }
}
