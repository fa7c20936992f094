// SPDX-License-Identifier: MIT

//! The [`Registry`] trait: the durable, shared store of DNS record intents,
//! plus the key/value encoding shared by every backend.

pub mod etcd;
pub mod memory;

use crate::errors::{SyncError, SyncResult};
use crate::record::{RecordIntent, RecordType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared, durable store of DNS record intents, plus an advisory locking
/// primitive used to serialize multi-key updates across hosts.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Register `intent`, creating or overwriting the value at its key.
    async fn register(&self, intent: &RecordIntent) -> SyncResult<()>;

    /// Remove the record at `name`/`record_type`, if present.
    async fn remove(&self, name: &str, record_type: RecordType) -> SyncResult<()>;

    /// List every record intent currently stored.
    async fn list(&self) -> SyncResult<Vec<RecordIntent>>;

    /// Acquire an advisory lock over `keys`, blocking (retrying every
    /// `retry_interval`) up to `timeout`. `keys` must already be in canonical
    /// order; see [`canonical_lock_keys`].
    async fn lock(
        &self,
        keys: &[String],
        ttl_secs: i64,
        retry_interval: Duration,
        timeout: Duration,
    ) -> SyncResult<()>;

    /// Release a previously acquired lock over `keys`.
    async fn unlock(&self, keys: &[String]) -> SyncResult<()>;
}

/// Sort and dedupe a set of lock keys into the canonical order every caller
/// must use, so two hosts racing to lock overlapping key sets always attempt
/// acquisition in the same order and cannot deadlock against each other.
#[must_use]
pub fn canonical_lock_keys(keys: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut keys: Vec<String> = keys.into_iter().collect();
    keys.sort();
    keys.dedup();
    keys
}

/// A held lock over one or more keys, released on drop (best effort) or via
/// [`LockGuard::release`] for deterministic teardown.
pub struct LockGuard {
    registry: Arc<dyn Registry>,
    keys: Vec<String>,
    released: AtomicBool,
}

impl LockGuard {
    /// Acquire a lock and wrap it in a guard that releases it automatically.
    ///
    /// # Errors
    /// Returns [`SyncError::LockTimeout`] if acquisition does not complete
    /// within `timeout`.
    pub async fn acquire(
        registry: Arc<dyn Registry>,
        keys: Vec<String>,
        ttl_secs: i64,
        retry_interval: Duration,
        timeout: Duration,
    ) -> SyncResult<Self> {
        registry.lock(&keys, ttl_secs, retry_interval, timeout).await?;
        Ok(Self {
            registry,
            keys,
            released: AtomicBool::new(false),
        })
    }

    /// Release the lock deterministically, propagating any error from the
    /// backend instead of swallowing it as the `Drop` path does.
    pub async fn release(self) -> SyncResult<()> {
        self.released.store(true, Ordering::SeqCst);
        self.registry.unlock(&self.keys).await
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let registry = Arc::clone(&self.registry);
        let keys = self.keys.clone();
        tokio::spawn(async move {
            if let Err(err) = registry.unlock(&keys).await {
                tracing::warn!(error = %err, ?keys, "best-effort lock release failed");
            }
        });
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryValue {
    host: String,
    record_type: RecordType,
    owner_hostname: String,
    owner_container_name: String,
    created: DateTime<Utc>,
}

/// Encode a DNS name into its reversed-label etcd key, e.g. `web.example.com`
/// under prefix `/records` becomes `/records/com/example/web`. Keys are
/// bijective with names: the record type lives only in the stored value, so
/// a name has exactly one registry entry regardless of type.
#[must_use]
pub fn encode_key(prefix: &str, name: &str) -> String {
    let reversed: Vec<&str> = name.trim_matches('.').split('.').rev().collect();
    format!("{prefix}/{}", reversed.join("/"))
}

/// Inverse of [`encode_key`]: recover the DNS name from a key under `prefix`.
///
/// # Errors
/// Returns [`SyncError::MalformedKey`] if `key` is not under `prefix` or
/// contains an empty path segment.
pub fn decode_key(prefix: &str, key: &str) -> SyncResult<String> {
    let suffix = key
        .strip_prefix(prefix)
        .and_then(|s| s.strip_prefix('/'))
        .ok_or_else(|| SyncError::MalformedKey(key.to_string()))?;
    let mut segments: Vec<&str> = suffix.split('/').collect();
    if segments.is_empty() || segments.iter().any(|segment| segment.is_empty()) {
        return Err(SyncError::MalformedKey(key.to_string()));
    }
    segments.reverse();
    Ok(segments.join("."))
}

/// Serialize a record intent's value payload (everything but the name, which
/// lives in the key).
///
/// # Errors
/// Never fails for a well-formed [`RecordIntent`]; kept fallible to mirror
/// [`decode_value`] and leave room for non-UTF8 future payloads.
pub fn encode_value(intent: &RecordIntent, created: DateTime<Utc>) -> SyncResult<String> {
    let value = RegistryValue {
        host: intent.host.clone(),
        record_type: intent.record_type,
        owner_hostname: intent.owner_hostname.clone(),
        owner_container_name: intent.owner_container_name.clone(),
        created,
    };
    serde_json::to_string(&value).map_err(|source| SyncError::MalformedValue {
        key: intent.name.clone(),
        source,
    })
}

/// Parse a stored value payload back into a [`RecordIntent`], pairing it with
/// the name recovered from the key.
///
/// # Errors
/// Returns [`SyncError::MalformedValue`] if `raw` is not valid JSON in the
/// expected shape.
pub fn decode_value(key: &str, name: &str, raw: &str) -> SyncResult<RecordIntent> {
    let value: RegistryValue =
        serde_json::from_str(raw).map_err(|source| SyncError::MalformedValue {
            key: key.to_string(),
            source,
        })?;
    Ok(RecordIntent::new(
        name,
        value.record_type,
        value.host,
        value.owner_hostname,
        value.owner_container_name,
    ))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
