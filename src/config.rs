// SPDX-License-Identifier: MIT

//! Process configuration, loaded once at startup and threaded explicitly through
//! every component (no hidden globals).

use crate::constants::{
    DEFAULT_DNS_DOMAIN_SUFFIX, DEFAULT_DNS_LABEL_KEY, DEFAULT_ETCD_HOST,
    DEFAULT_ETCD_PATH_PREFIX, DEFAULT_ETCD_PORT, DEFAULT_LOCK_RETRY_INTERVAL_MILLIS,
    DEFAULT_LOCK_TIMEOUT_SECS, DEFAULT_LOCK_TTL_SECS, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_STALENESS_TTL_SECS, METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PATH,
    METRICS_SERVER_PORT,
};
use std::time::Duration;

/// Fully resolved daemon configuration.
///
/// Recognized environment variables, all optional (defaults shown):
///
/// | Variable | Default |
/// |---|---|
/// | `DNS_SYNC_ETCD_HOST` | `127.0.0.1` |
/// | `DNS_SYNC_ETCD_PORT` | `2379` |
/// | `DNS_SYNC_ETCD_PATH_PREFIX` | `/records` |
/// | `DNS_SYNC_ETCD_LOCK_TTL` | `10` |
/// | `DNS_SYNC_ETCD_LOCK_TIMEOUT` | `30` |
/// | `DNS_SYNC_ETCD_LOCK_RETRY_INTERVAL_MS` | `250` |
/// | `DNS_SYNC_HOSTNAME` | OS hostname, or `dns-sync-<random>` |
/// | `DNS_SYNC_POLL_INTERVAL` | `5` |
/// | `DNS_SYNC_STALENESS_TTL` | `60` |
/// | `DNS_SYNC_LOCK_SYNC_TICK` | `true` |
/// | `DNS_SYNC_DNS_LABEL_KEY` | `dns-sync.register` |
/// | `DNS_SYNC_DNS_DOMAIN_SUFFIX` | `local` |
/// | `DNS_SYNC_METRICS_BIND_ADDRESS` | `0.0.0.0` |
/// | `DNS_SYNC_METRICS_PORT` | `9090` |
/// | `DNS_SYNC_METRICS_PATH` | `/metrics` |
#[derive(Debug, Clone)]
pub struct Settings {
    pub etcd_host: String,
    pub etcd_port: u16,
    pub etcd_path_prefix: String,
    pub etcd_lock_ttl_secs: i64,
    pub etcd_lock_timeout: Duration,
    pub etcd_lock_retry_interval: Duration,
    pub hostname: String,
    pub poll_interval: Duration,
    pub staleness_ttl_secs: i64,
    /// Whether the sync engine wraps each reconciliation tick in the `"sync"` lock.
    /// See `SPEC_FULL.md` §9 Open Questions.
    pub lock_sync_tick: bool,
    pub dns_label_key: String,
    pub dns_domain_suffix: String,
    pub metrics_bind_address: String,
    pub metrics_port: u16,
    pub metrics_path: String,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_or_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn default_hostname() -> String {
    std::env::var("DNS_SYNC_HOSTNAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| format!("dns-sync-{}", std::process::id()))
}

impl Settings {
    /// Load configuration from environment variables, falling back to documented defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            etcd_host: env_or_string("DNS_SYNC_ETCD_HOST", DEFAULT_ETCD_HOST),
            etcd_port: env_or("DNS_SYNC_ETCD_PORT", DEFAULT_ETCD_PORT),
            etcd_path_prefix: env_or_string(
                "DNS_SYNC_ETCD_PATH_PREFIX",
                DEFAULT_ETCD_PATH_PREFIX,
            ),
            etcd_lock_ttl_secs: env_or("DNS_SYNC_ETCD_LOCK_TTL", DEFAULT_LOCK_TTL_SECS),
            etcd_lock_timeout: Duration::from_secs(env_or(
                "DNS_SYNC_ETCD_LOCK_TIMEOUT",
                DEFAULT_LOCK_TIMEOUT_SECS,
            )),
            etcd_lock_retry_interval: Duration::from_millis(env_or(
                "DNS_SYNC_ETCD_LOCK_RETRY_INTERVAL_MS",
                DEFAULT_LOCK_RETRY_INTERVAL_MILLIS,
            )),
            hostname: default_hostname(),
            poll_interval: Duration::from_secs(env_or(
                "DNS_SYNC_POLL_INTERVAL",
                DEFAULT_POLL_INTERVAL_SECS,
            )),
            staleness_ttl_secs: env_or(
                "DNS_SYNC_STALENESS_TTL",
                DEFAULT_STALENESS_TTL_SECS,
            ),
            lock_sync_tick: env_or("DNS_SYNC_LOCK_SYNC_TICK", true),
            dns_label_key: env_or_string("DNS_SYNC_DNS_LABEL_KEY", DEFAULT_DNS_LABEL_KEY),
            dns_domain_suffix: env_or_string(
                "DNS_SYNC_DNS_DOMAIN_SUFFIX",
                DEFAULT_DNS_DOMAIN_SUFFIX,
            ),
            metrics_bind_address: env_or_string(
                "DNS_SYNC_METRICS_BIND_ADDRESS",
                METRICS_SERVER_BIND_ADDRESS,
            ),
            metrics_port: env_or("DNS_SYNC_METRICS_PORT", METRICS_SERVER_PORT),
            metrics_path: env_or_string("DNS_SYNC_METRICS_PATH", METRICS_SERVER_PATH),
        }
    }

    /// The etcd endpoint as a `host:port` string.
    #[must_use]
    pub fn etcd_endpoint(&self) -> String {
        format!("{}:{}", self.etcd_host, self.etcd_port)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
