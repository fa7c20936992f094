// SPDX-License-Identifier: MIT

//! An in-process [`Registry`] fake used by tests; implements the same lock
//! contention semantics as the etcd-backed registry without needing a live
//! etcd cluster.

use super::Registry;
use crate::errors::{SyncError, SyncResult};
use crate::record::{RecordIntent, RecordType};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// In-memory registry fake. TTLs are accepted but not enforced: a lock is
/// held until explicitly released, which is sufficient for deterministic
/// tests and avoids a background reaper the fake doesn't need.
#[derive(Default)]
pub struct InMemoryRegistry {
    records: Mutex<HashMap<(String, RecordType), RecordIntent>>,
    locks: Mutex<HashSet<String>>,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn try_acquire(&self, keys: &[String]) -> bool {
        let mut locks = self.locks.lock().await;
        if keys.iter().any(|key| locks.contains(key)) {
            return false;
        }
        for key in keys {
            locks.insert(key.clone());
        }
        true
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn register(&self, intent: &RecordIntent) -> SyncResult<()> {
        let mut records = self.records.lock().await;
        records.insert((intent.name.clone(), intent.record_type), intent.clone());
        Ok(())
    }

    async fn remove(&self, name: &str, record_type: RecordType) -> SyncResult<()> {
        let mut records = self.records.lock().await;
        records.remove(&(name.to_string(), record_type));
        Ok(())
    }

    async fn list(&self) -> SyncResult<Vec<RecordIntent>> {
        let records = self.records.lock().await;
        Ok(records.values().cloned().collect())
    }

    async fn lock(
        &self,
        keys: &[String],
        _ttl_secs: i64,
        retry_interval: Duration,
        timeout: Duration,
    ) -> SyncResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.try_acquire(keys).await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SyncError::LockTimeout {
                    keys: keys.to_vec(),
                    elapsed_secs: timeout.as_secs(),
                });
            }
            sleep(retry_interval).await;
        }
    }

    async fn unlock(&self, keys: &[String]) -> SyncResult<()> {
        let mut locks = self.locks.lock().await;
        for key in keys {
            locks.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
