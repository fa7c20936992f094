// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the dns-sync daemon.
//!
//! This module provides comprehensive metrics collection with the namespace prefix
//! `dns_sync_`.
//!
//! # Metrics Categories
//!
//! - **Sync Tick Metrics** - Track reconciliation tick operations and their outcomes
//! - **Record Lifecycle Metrics** - Track records added, removed, and currently owned
//! - **Lock Metrics** - Track lock acquisition latency and contention
//! - **Registry Metrics** - Track backend I/O latency
//! - **Error Metrics** - Track error conditions and types
//!
//! # Example
//!
//! ```rust,no_run
//! use dns_sync::metrics::record_tick_success;
//!
//! record_tick_success(std::time::Duration::from_millis(50));
//! ```

use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all dns-sync metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "dns_sync";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Sync Tick Metrics
// ============================================================================

/// Total number of reconciliation ticks by outcome
///
/// Labels:
/// - `status`: Outcome (`success`, `error`)
pub static SYNC_TICKS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_sync_ticks_total"),
        "Total number of reconciliation ticks by outcome",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of a full reconciliation tick in seconds
pub static SYNC_TICK_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_sync_tick_duration_seconds"),
        "Duration of a reconciliation tick in seconds",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]);
    let histogram = HistogramVec::new(opts, &[] as &[&str]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Record Lifecycle Metrics
// ============================================================================

/// Total number of records registered into etcd
///
/// Labels:
/// - `record_type`: `A` or `CNAME`
pub static RECORDS_ADDED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_records_added_total"),
        "Total number of records registered into the registry",
    );
    let counter = CounterVec::new(opts, &["record_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of records removed from etcd
///
/// Labels:
/// - `record_type`: `A` or `CNAME`
pub static RECORDS_REMOVED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_records_removed_total"),
        "Total number of records removed from the registry",
    );
    let counter = CounterVec::new(opts, &["record_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Number of records currently owned by this host, per the in-memory state tracker
pub static RECORDS_OWNED: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_records_owned"),
        "Number of DNS record intents currently owned by this host",
    );
    let gauge = GaugeVec::new(opts, &[] as &[&str]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Total number of stale tracker entries reaped after the staleness TTL elapsed
pub static STALE_ENTRIES_REAPED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_stale_entries_reaped_total"),
        "Total number of removed-but-unconfirmed tracker entries reaped",
    );
    let counter = CounterVec::new(opts, &[] as &[&str]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Lock Metrics
// ============================================================================

/// Duration spent waiting to acquire the distributed lock(s), in seconds
pub static LOCK_WAIT_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_lock_wait_duration_seconds"),
        "Time spent waiting to acquire the distributed registry lock",
    )
    .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0]);
    let histogram = HistogramVec::new(opts, &[] as &[&str]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of lock acquisition failures (timeouts)
pub static LOCK_TIMEOUTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_lock_timeouts_total"),
        "Total number of times lock acquisition timed out",
    );
    let counter = CounterVec::new(opts, &[] as &[&str]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Registry I/O Metrics
// ============================================================================

/// Duration of individual registry backend operations, in seconds
///
/// Labels:
/// - `operation`: `register`, `remove`, `list`
pub static REGISTRY_OP_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_registry_op_duration_seconds"),
        "Duration of registry backend operations in seconds",
    )
    .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]);
    let histogram = HistogramVec::new(opts, &["operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of errors by category
///
/// Labels:
/// - `error_type`: Category of error (`etcd`, `docker`, `malformed_value`, `malformed_key`,
///   `lock_timeout`, `lock_not_held`, `event_source_closed`, `invalid_intent`)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by category",
    );
    let counter = CounterVec::new(opts, &["error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful reconciliation tick.
pub fn record_tick_success(duration: Duration) {
    SYNC_TICKS_TOTAL.with_label_values(&["success"]).inc();
    SYNC_TICK_DURATION_SECONDS
        .with_label_values(&[] as &[&str])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation tick.
pub fn record_tick_error(duration: Duration) {
    SYNC_TICKS_TOTAL.with_label_values(&["error"]).inc();
    SYNC_TICK_DURATION_SECONDS
        .with_label_values(&[] as &[&str])
        .observe(duration.as_secs_f64());
}

/// Record that `count` records of `record_type` were added to the registry.
pub fn record_records_added(record_type: &str, count: usize) {
    RECORDS_ADDED_TOTAL
        .with_label_values(&[record_type])
        .inc_by(count as f64);
}

/// Record that `count` records of `record_type` were removed from the registry.
pub fn record_records_removed(record_type: &str, count: usize) {
    RECORDS_REMOVED_TOTAL
        .with_label_values(&[record_type])
        .inc_by(count as f64);
}

/// Set the current gauge of owned record intents.
pub fn set_records_owned(count: usize) {
    RECORDS_OWNED
        .with_label_values(&[] as &[&str])
        .set(count as f64);
}

/// Record that a stale tracker entry was reaped.
pub fn record_stale_entry_reaped() {
    STALE_ENTRIES_REAPED_TOTAL
        .with_label_values(&[] as &[&str])
        .inc();
}

/// Record time spent waiting for a distributed lock.
pub fn record_lock_wait(duration: Duration) {
    LOCK_WAIT_DURATION_SECONDS
        .with_label_values(&[] as &[&str])
        .observe(duration.as_secs_f64());
}

/// Record a lock acquisition timeout.
pub fn record_lock_timeout() {
    LOCK_TIMEOUTS_TOTAL.with_label_values(&[] as &[&str]).inc();
}

/// Record the latency of a registry backend operation.
pub fn record_registry_op(operation: &str, duration: Duration) {
    REGISTRY_OP_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

/// Record an error by category.
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tick_success() {
        record_tick_success(Duration::from_millis(50));
        let counter = SYNC_TICKS_TOTAL.with_label_values(&["success"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_record_tick_error() {
        record_tick_error(Duration::from_millis(10));
        let counter = SYNC_TICKS_TOTAL.with_label_values(&["error"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_records_added_and_removed() {
        record_records_added("A", 3);
        record_records_removed("A", 1);
        assert!(RECORDS_ADDED_TOTAL.with_label_values(&["A"]).get() >= 3.0);
        assert!(RECORDS_REMOVED_TOTAL.with_label_values(&["A"]).get() >= 1.0);
    }

    #[test]
    fn test_gather_metrics() {
        record_tick_success(Duration::from_millis(1));
        let result = gather_metrics();
        assert!(result.is_ok(), "Gathering metrics should succeed");

        let metrics_text = result.unwrap();
        assert!(
            metrics_text.contains("dns_sync"),
            "Metrics should contain namespace prefix"
        );
        assert!(
            metrics_text.contains("sync_ticks_total"),
            "Metrics should contain sync tick counter"
        );
    }
}
