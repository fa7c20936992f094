// SPDX-License-Identifier: MIT

//! In-process tracker of desired record intents, keyed by the container that
//! produced them.
//!
//! A container's intents are kept around for a grace period after the
//! container stops (`removed_at` set but not yet reaped) so a flapping
//! container does not cause a record to be deleted and immediately
//! re-created.

use crate::record::RecordIntent;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

struct TrackedEntry {
    intents: Vec<RecordIntent>,
    removed_at: Option<DateTime<Utc>>,
}

/// Tracks the set of DNS record intents this host currently wants registered.
#[derive(Default)]
pub struct StateTracker {
    entries: Mutex<HashMap<String, TrackedEntry>>,
}

impl StateTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `container_id` currently wants `intents` registered,
    /// clearing any pending removal. Replaces whatever intents were
    /// previously tracked for this container.
    pub async fn upsert(&self, container_id: impl Into<String>, intents: Vec<RecordIntent>) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            container_id.into(),
            TrackedEntry {
                intents,
                removed_at: None,
            },
        );
    }

    /// Mark `container_id`'s intents as removed as of `now`. The entry is
    /// kept around until [`Self::remove_stale`] reaps it, so it no longer
    /// contributes to [`Self::get_all_desired_record_intents`] but is still
    /// available for diagnostics until the staleness TTL elapses.
    pub async fn mark_removed(&self, container_id: &str, now: DateTime<Utc>) {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(container_id) {
            entry.removed_at = Some(now);
        }
    }

    /// Flat union of intents over every entry that is not currently marked
    /// removed.
    pub async fn get_all_desired_record_intents(&self) -> Vec<RecordIntent> {
        let entries = self.entries.lock().await;
        entries
            .values()
            .filter(|entry| entry.removed_at.is_none())
            .flat_map(|entry| entry.intents.iter().cloned())
            .collect()
    }

    /// Permanently drop entries that were marked removed at least `ttl_secs`
    /// seconds before `now`. Returns the number of entries reaped.
    pub async fn remove_stale(&self, now: DateTime<Utc>, ttl_secs: i64) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| match entry.removed_at {
            Some(removed_at) => (now - removed_at).num_seconds() < ttl_secs,
            None => true,
        });
        before - entries.len()
    }

    /// Number of entries currently tracked, removed or not. Exposed for tests
    /// and diagnostics.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod state_tests;
