// SPDX-License-Identifier: MIT

//! Wires a container event source through intent derivation and the state
//! tracker, and periodically reconciles desired state against the registry.

use crate::config::Settings;
use crate::derive::IntentDeriver;
use crate::errors::SyncResult;
use crate::events::{ContainerEventKind, EventSource};
use crate::metrics;
use crate::reconcile::reconcile;
use crate::registry::{canonical_lock_keys, LockGuard, Registry};
use crate::state::StateTracker;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Drives the event-to-registry sync loop for one host.
pub struct SyncEngine {
    registry: Arc<dyn Registry>,
    event_source: Arc<dyn EventSource>,
    deriver: Arc<dyn IntentDeriver>,
    state: Arc<StateTracker>,
    settings: Settings,
    cancel: CancellationToken,
}

impl SyncEngine {
    #[must_use]
    pub fn new(
        registry: Arc<dyn Registry>,
        event_source: Arc<dyn EventSource>,
        deriver: Arc<dyn IntentDeriver>,
        settings: Settings,
    ) -> Self {
        Self {
            registry,
            event_source,
            deriver,
            state: Arc::new(StateTracker::new()),
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Signal the running loop to stop after its current tick.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Consume events from the event source, updating desired state, until
    /// cancelled or the source closes.
    async fn consume_events(
        state: Arc<StateTracker>,
        deriver: Arc<dyn IntentDeriver>,
        hostname: String,
        mut events: mpsc::Receiver<crate::events::ContainerEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                event = events.recv() => {
                    let Some(event) = event else { break };
                    match event.kind {
                        ContainerEventKind::Started => {
                            let intents = deriver.derive(&event, &hostname);
                            if !intents.is_empty() {
                                state.upsert(event.container_id.clone(), intents).await;
                            }
                        }
                        ContainerEventKind::Stopped => {
                            state.mark_removed(&event.container_id, Utc::now()).await;
                        }
                    }
                }
            }
        }
    }

    /// Run one reconciliation tick: diff this host's desired intents against
    /// what it currently owns in the registry, and apply the difference.
    ///
    /// # Errors
    /// Returns an error if the registry lock cannot be acquired, or if a
    /// registry I/O operation fails.
    pub async fn tick(&self) -> SyncResult<()> {
        let started = Instant::now();
        let result = self.tick_inner().await;
        match &result {
            Ok(()) => metrics::record_tick_success(started.elapsed()),
            Err(err) => {
                metrics::record_tick_error(started.elapsed());
                metrics::record_error(error_category(err));
            }
        }
        result
    }

    async fn tick_inner(&self) -> SyncResult<()> {
        let desired = self.state.get_all_desired_record_intents().await;
        metrics::set_records_owned(desired.len());

        let _guard = if self.settings.lock_sync_tick {
            let keys = canonical_lock_keys(vec![crate::constants::SYNC_LOCK_KEY.to_string()]);
            let wait_started = Instant::now();
            let guard = LockGuard::acquire(
                Arc::clone(&self.registry),
                keys,
                self.settings.etcd_lock_ttl_secs,
                self.settings.etcd_lock_retry_interval,
                self.settings.etcd_lock_timeout,
            )
            .await;
            metrics::record_lock_wait(wait_started.elapsed());
            match guard {
                Ok(guard) => Some(guard),
                Err(err) => {
                    metrics::record_lock_timeout();
                    return Err(err);
                }
            }
        } else {
            None
        };

        let all_actual = self.registry.list().await?;
        let owned_actual: Vec<_> = all_actual
            .into_iter()
            .filter(|intent| intent.owner_hostname == self.settings.hostname)
            .collect();

        let outcome = reconcile(&desired, &owned_actual);

        // Removals complete before any addition begins, so renaming a record
        // (same name, different value) never leaves two entries visible at once.
        for intent in &outcome.to_remove {
            self.registry.remove(&intent.name, intent.record_type).await?;
            metrics::record_records_removed(intent.record_type.as_str(), 1);
        }
        for intent in &outcome.to_add {
            self.registry.register(intent).await?;
            metrics::record_records_added(intent.record_type.as_str(), 1);
        }

        let reaped = self
            .state
            .remove_stale(Utc::now(), self.settings.staleness_ttl_secs)
            .await;
        for _ in 0..reaped {
            metrics::record_stale_entry_reaped();
        }

        Ok(())
    }

    /// Run the engine until cancelled: consumes events in the background and
    /// reconciles on every `poll_interval` tick. Errors from individual ticks
    /// are logged and do not stop the loop; transient errors are expected
    /// under normal operation (lock contention, a momentary etcd hiccup).
    pub async fn run(&self) -> SyncResult<()> {
        let events = self.event_source.subscribe().await?;
        let consumer = tokio::spawn(Self::consume_events(
            Arc::clone(&self.state),
            Arc::clone(&self.deriver),
            self.settings.hostname.clone(),
            events,
            self.cancel.clone(),
        ));

        let mut interval = tokio::time::interval(self.settings.poll_interval);
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(err) = self.tick().await {
                        if err.is_transient() {
                            tracing::warn!(error = %err, "reconciliation tick failed, will retry");
                        } else {
                            tracing::error!(error = %err, "reconciliation tick failed");
                        }
                    }
                }
            }
        }

        self.event_source.stop().await;
        let _ = consumer.await;
        Ok(())
    }
}

fn error_category(err: &crate::errors::SyncError) -> &'static str {
    use crate::errors::SyncError;
    match err {
        SyncError::Etcd(_) => "etcd",
        SyncError::Docker(_) => "docker",
        SyncError::MalformedValue { .. } => "malformed_value",
        SyncError::MalformedKey(_) => "malformed_key",
        SyncError::LockTimeout { .. } => "lock_timeout",
        SyncError::LockNotHeld(_) => "lock_not_held",
        SyncError::EventSourceClosed(_) => "event_source_closed",
        SyncError::InvalidIntent(_) => "invalid_intent",
    }
}

#[cfg(test)]
#[path = "sync_engine_tests.rs"]
mod sync_engine_tests;
