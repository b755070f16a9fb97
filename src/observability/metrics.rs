//! Metrics registry for the gateway
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters shared by the orchestrator and the HTTP layer
///
/// # Thread Safety
///
/// All counters use atomic operations with Relaxed ordering.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Call requests received
    requests_received: AtomicU64,
    /// Requests rejected by validation
    requests_rejected: AtomicU64,
    /// Remote calls that returned without a failure message
    calls_succeeded: AtomicU64,
    /// Remote calls that returned a failure message
    calls_failed: AtomicU64,
    /// Transport errors and timeouts
    transport_failures: AtomicU64,
    /// Schemas read from the store
    schema_loads: AtomicU64,
    /// Schemas served from cache
    schema_cache_hits: AtomicU64,
    /// Schema lookups that failed
    schema_failures: AtomicU64,
    /// Table reads executed
    table_reads: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_requests_received(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_requests_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_calls_succeeded(&self) {
        self.calls_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_calls_failed(&self) {
        self.calls_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_transport_failures(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_schema_loads(&self) {
        self.schema_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_schema_cache_hits(&self) {
        self.schema_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_schema_failures(&self) {
        self.schema_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_table_reads(&self) {
        self.table_reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_received: self.requests_received.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            calls_succeeded: self.calls_succeeded.load(Ordering::Relaxed),
            calls_failed: self.calls_failed.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            schema_loads: self.schema_loads.load(Ordering::Relaxed),
            schema_cache_hits: self.schema_cache_hits.load(Ordering::Relaxed),
            schema_failures: self.schema_failures.load(Ordering::Relaxed),
            table_reads: self.table_reads.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_received: u64,
    pub requests_rejected: u64,
    pub calls_succeeded: u64,
    pub calls_failed: u64,
    pub transport_failures: u64,
    pub schema_loads: u64,
    pub schema_cache_hits: u64,
    pub schema_failures: u64,
    pub table_reads: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_zero() {
        let metrics = MetricsRegistry::new();
        let snap = metrics.snapshot();
        assert_eq!(snap.requests_received, 0);
        assert_eq!(snap.schema_cache_hits, 0);
    }

    #[test]
    fn test_counters_increment() {
        let metrics = MetricsRegistry::new();
        metrics.increment_requests_received();
        metrics.increment_requests_received();
        metrics.increment_requests_rejected();
        metrics.increment_schema_cache_hits();

        let snap = metrics.snapshot();
        assert_eq!(snap.requests_received, 2);
        assert_eq!(snap.requests_rejected, 1);
        assert_eq!(snap.schema_cache_hits, 1);
        assert_eq!(snap.calls_succeeded, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = MetricsRegistry::new();
        metrics.increment_table_reads();

        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["table_reads"], 1);
        assert_eq!(json["transport_failures"], 0);
    }

    #[test]
    fn test_concurrent_increments() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..100 {
                        m.increment_calls_succeeded();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(metrics.snapshot().calls_succeeded, 400);
    }
}
