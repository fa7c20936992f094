// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the dns-sync daemon.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Registry Constants
// ============================================================================

/// Default etcd host
pub const DEFAULT_ETCD_HOST: &str = "127.0.0.1";

/// Default etcd client port
pub const DEFAULT_ETCD_PORT: u16 = 2379;

/// Default key-space prefix under which every record is stored
pub const DEFAULT_ETCD_PATH_PREFIX: &str = "/records";

/// Key-space prefix under which advisory locks live, regardless of `etcd_path_prefix`
pub const LOCKS_PREFIX: &str = "/locks";

/// Default lease TTL, in seconds, for an acquired lock key
pub const DEFAULT_LOCK_TTL_SECS: i64 = 10;

/// Default wall-clock budget, in seconds, to wait for lock acquisition before failing
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 30;

/// Default sleep between compare-and-swap retries while acquiring a lock
pub const DEFAULT_LOCK_RETRY_INTERVAL_MILLIS: u64 = 250;

/// Key used to serialize an entire reconciliation tick across hosts
pub const SYNC_LOCK_KEY: &str = "sync";

// ============================================================================
// Sync Engine Constants
// ============================================================================

/// Default period between reconciliation ticks
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default TTL after which a `removed` tracker entry is reaped (matches the
/// original implementation's hard-coded 60 seconds)
pub const DEFAULT_STALENESS_TTL_SECS: i64 = 60;

// ============================================================================
// Default Intent Derivation Constants
// ============================================================================

/// Container label that opts a container into the default DNS intent policy
pub const DEFAULT_DNS_LABEL_KEY: &str = "dns-sync.register";

/// Domain suffix appended to a container's name by the default intent policy
pub const DEFAULT_DNS_DOMAIN_SUFFIX: &str = "local";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for the Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for the Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 9090;

/// Path for the Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for the metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
