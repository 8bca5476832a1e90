//! Routing metrics for observability
//!
//! Counters describing how events moved through a routing appender and how
//! its set of route appenders changed over time.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for routing observability
///
/// # Example
///
/// ```
/// use rust_log_router::routing::RoutingMetrics;
///
/// let metrics = RoutingMetrics::new();
/// metrics.record_forwarded();
/// metrics.record_dropped();
///
/// assert_eq!(metrics.forwarded_count(), 1);
/// assert_eq!(metrics.drop_rate(), 50.0);
/// ```
#[derive(Debug)]
pub struct RoutingMetrics {
    /// Events handed to a route appender
    forwarded: AtomicU64,

    /// Events that reached no appender
    dropped: AtomicU64,

    /// Route appenders built from a definition
    created: AtomicU64,

    /// Failed attempts at building a route appender
    construction_failures: AtomicU64,

    /// Route appenders evicted by a purge policy or manual delete
    purged: AtomicU64,
}

impl RoutingMetrics {
    pub const fn new() -> Self {
        Self {
            forwarded: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            created: AtomicU64::new(0),
            construction_failures: AtomicU64::new(0),
            purged: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn forwarded_count(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn construction_failures(&self) -> u64 {
        self.construction_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn purged_count(&self) -> u64 {
        self.purged.load(Ordering::Relaxed)
    }

    /// Record a forwarded event, returning the previous count
    #[inline]
    pub fn record_forwarded(&self) -> u64 {
        self.forwarded.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_created(&self) -> u64 {
        self.created.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_construction_failure(&self) -> u64 {
        self.construction_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_purged(&self) -> u64 {
        self.purged.fetch_add(1, Ordering::Relaxed)
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if no events have been routed.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.forwarded_count() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.forwarded.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.created.store(0, Ordering::Relaxed);
        self.construction_failures.store(0, Ordering::Relaxed);
        self.purged.store(0, Ordering::Relaxed);
    }
}

impl Default for RoutingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RoutingMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            forwarded: AtomicU64::new(self.forwarded_count()),
            dropped: AtomicU64::new(self.dropped_count()),
            created: AtomicU64::new(self.created_count()),
            construction_failures: AtomicU64::new(self.construction_failures()),
            purged: AtomicU64::new(self.purged_count()),
        }
    }
}
