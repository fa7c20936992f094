// SPDX-License-Identifier: MIT

//! Production [`Registry`] backed by etcd.
//!
//! Locking uses a lease-bound compare-and-swap: acquiring key `k` means
//! successfully creating it (`version == 0`) under a fresh lease with the
//! configured TTL. A crashed holder's lock is reclaimed automatically once
//! its lease expires, bounding the worst-case blast radius of a stuck host.

use super::{decode_key, decode_value, encode_key, encode_value, Registry};
use crate::errors::{SyncError, SyncResult};
use crate::record::{RecordIntent, RecordType};
use async_trait::async_trait;
use chrono::Utc;
use etcd_client::{Client, Compare, CompareOp, GetOptions, Txn, TxnOp};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// etcd-backed registry. `path_prefix` scopes record keys; lock keys live
/// under a fixed `/locks` prefix regardless of `path_prefix` so multiple
/// daemons sharing an etcd cluster with differently configured prefixes
/// never collide on locking.
pub struct EtcdRegistry {
    client: Mutex<Client>,
    path_prefix: String,
    locks_prefix: String,
    // maps a held lock key to the lease ID that backs it, so release can
    // avoid deleting a key some other host has since reclaimed.
    held_leases: Mutex<HashMap<String, i64>>,
}

impl EtcdRegistry {
    /// Connect to the etcd cluster at `endpoint` (e.g. `127.0.0.1:2379`).
    ///
    /// # Errors
    /// Returns an error if the initial connection fails.
    pub async fn connect(
        endpoint: &str,
        path_prefix: impl Into<String>,
        locks_prefix: impl Into<String>,
    ) -> SyncResult<Self> {
        let client = Client::connect([endpoint], None).await?;
        Ok(Self {
            client: Mutex::new(client),
            path_prefix: path_prefix.into(),
            locks_prefix: locks_prefix.into(),
            held_leases: Mutex::new(HashMap::new()),
        })
    }

    fn lock_key(&self, key: &str) -> String {
        format!("{}/{}", self.locks_prefix, key)
    }

    async fn try_acquire_one(&self, key: &str, ttl_secs: i64) -> SyncResult<bool> {
        let mut client = self.client.lock().await;
        let lease = client.lease_grant(ttl_secs, None).await?;
        let lease_id = lease.id();

        let lock_key = self.lock_key(key);
        let txn = Txn::new()
            .when(vec![Compare::version(lock_key.clone(), CompareOp::Equal, 0)])
            .and_then(vec![TxnOp::put(
                lock_key.clone(),
                Utc::now().to_rfc3339(),
                Some(etcd_client::PutOptions::new().with_lease(lease_id)),
            )]);
        let response = client.txn(txn).await?;

        if response.succeeded() {
            self.held_leases
                .lock()
                .await
                .insert(lock_key, lease_id);
            Ok(true)
        } else {
            // we didn't win the key; give up the lease we provisioned for it.
            let _ = client.lease_revoke(lease_id).await;
            Ok(false)
        }
    }

    async fn release_one(&self, key: &str) -> SyncResult<()> {
        let lock_key = self.lock_key(key);
        let mut held = self.held_leases.lock().await;
        let Some(lease_id) = held.remove(&lock_key) else {
            return Ok(());
        };
        drop(held);

        let mut client = self.client.lock().await;
        let txn = Txn::new()
            .when(vec![Compare::lease(lock_key.clone(), CompareOp::Equal, lease_id)])
            .and_then(vec![TxnOp::delete(lock_key, None)]);
        client.txn(txn).await?;
        Ok(())
    }
}

#[async_trait]
impl Registry for EtcdRegistry {
    async fn register(&self, intent: &RecordIntent) -> SyncResult<()> {
        let key = encode_key(&self.path_prefix, &intent.name);
        let value = encode_value(intent, Utc::now())?;
        let mut client = self.client.lock().await;
        client.put(key, value, None).await?;
        Ok(())
    }

    async fn remove(&self, name: &str, _record_type: RecordType) -> SyncResult<()> {
        let key = encode_key(&self.path_prefix, name);
        let mut client = self.client.lock().await;
        client.delete(key, None).await?;
        Ok(())
    }

    async fn list(&self) -> SyncResult<Vec<RecordIntent>> {
        let prefix = format!("{}/", self.path_prefix);
        let mut client = self.client.lock().await;
        let response = client
            .get(prefix.clone(), Some(GetOptions::new().with_prefix()))
            .await?;

        let mut intents = Vec::with_capacity(response.kvs().len());
        for kv in response.kvs() {
            let (key, raw) = match (kv.key_str(), kv.value_str()) {
                (Ok(key), Ok(raw)) => (key, raw),
                (key, value) => {
                    tracing::warn!(
                        error = ?key.err().or(value.err()),
                        "skipping registry entry with non-UTF8 key or value"
                    );
                    continue;
                }
            };
            let name = match decode_key(&self.path_prefix, key) {
                Ok(decoded) => decoded,
                Err(err) => {
                    tracing::warn!(%key, error = %err, "skipping malformed registry key");
                    continue;
                }
            };
            let intent = match decode_value(key, &name, raw) {
                Ok(intent) => intent,
                Err(err) => {
                    tracing::warn!(%key, error = %err, "skipping malformed registry value");
                    continue;
                }
            };
            intents.push(intent);
        }
        Ok(intents)
    }

    async fn lock(
        &self,
        keys: &[String],
        ttl_secs: i64,
        retry_interval: Duration,
        timeout: Duration,
    ) -> SyncResult<()> {
        let deadline = Instant::now() + timeout;
        let mut acquired = Vec::new();

        for key in keys {
            loop {
                if self.try_acquire_one(key, ttl_secs).await? {
                    acquired.push(key.clone());
                    break;
                }
                if Instant::now() >= deadline {
                    for held in acquired.iter().rev() {
                        let _ = self.release_one(held).await;
                    }
                    return Err(SyncError::LockTimeout {
                        keys: keys.to_vec(),
                        elapsed_secs: timeout.as_secs(),
                    });
                }
                sleep(retry_interval).await;
            }
        }
        Ok(())
    }

    async fn unlock(&self, keys: &[String]) -> SyncResult<()> {
        for key in keys.iter().rev() {
            self.release_one(key).await?;
        }
        Ok(())
    }
}
