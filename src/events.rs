// SPDX-License-Identifier: MIT

//! Container lifecycle events and the sources that produce them.

use crate::errors::{SyncError, SyncResult};
use async_trait::async_trait;
use bollard::query_parameters::{EventsOptionsBuilder, InspectContainerOptions};
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Whether a container started or stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerEventKind {
    Started,
    Stopped,
}

/// A single container lifecycle event, reduced to exactly what the intent deriver needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEvent {
    pub kind: ContainerEventKind,
    pub container_id: String,
    pub container_name: String,
    pub labels: HashMap<String, String>,
    /// Primary IPv4 address of the container on its network, if known.
    pub ip_address: Option<String>,
}

/// A source of container lifecycle events.
///
/// Implementations are expected to be long-lived: `subscribe` returns a receiver
/// that stays open until `stop` is called or the underlying stream ends.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Begin streaming events. Returns a channel the caller polls for new events.
    async fn subscribe(&self) -> SyncResult<mpsc::Receiver<ContainerEvent>>;

    /// Stop producing events. Idempotent.
    async fn stop(&self);
}

/// Test fake: an event source fed by a channel under direct test control.
pub struct ChannelEventSource {
    inner: tokio::sync::Mutex<Option<mpsc::Receiver<ContainerEvent>>>,
}

impl ChannelEventSource {
    /// Build a fake source paired with the sender side a test drives directly.
    #[must_use]
    pub fn new_pair(buffer: usize) -> (mpsc::Sender<ContainerEvent>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (
            tx,
            Self {
                inner: tokio::sync::Mutex::new(Some(rx)),
            },
        )
    }
}

#[async_trait]
impl EventSource for ChannelEventSource {
    async fn subscribe(&self) -> SyncResult<mpsc::Receiver<ContainerEvent>> {
        self.inner
            .lock()
            .await
            .take()
            .ok_or_else(|| SyncError::EventSourceClosed("already subscribed".to_string()))
    }

    async fn stop(&self) {
        self.inner.lock().await.take();
    }
}

/// Production event source backed by the local Docker Engine API socket.
pub struct DockerEventSource {
    docker: Docker,
}

impl DockerEventSource {
    /// Connect to the Docker daemon over its default local socket.
    ///
    /// # Errors
    /// Returns an error if the daemon socket cannot be reached.
    pub fn connect_local() -> SyncResult<Self> {
        let docker = Docker::connect_with_local_defaults().map_err(SyncError::Docker)?;
        Ok(Self { docker })
    }

    fn container_name(labels: &HashMap<String, String>, fallback: &str) -> String {
        labels
            .get("com.docker.compose.service")
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Look up the primary IP address of a running container by inspecting it.
    /// Returns `None` if the inspect call fails or the container has no
    /// attached network (e.g. it uses `network_mode: host`).
    async fn fetch_ip_address(docker: &Docker, container_id: &str) -> Option<String> {
        let details = match docker
            .inspect_container(container_id, None::<InspectContainerOptions>)
            .await
        {
            Ok(details) => details,
            Err(err) => {
                tracing::warn!(error = %err, container_id, "failed to inspect container for its IP address");
                return None;
            }
        };

        details
            .network_settings?
            .networks?
            .into_values()
            .find_map(|endpoint| endpoint.ip_address.filter(|ip| !ip.is_empty()))
    }
}

#[async_trait]
impl EventSource for DockerEventSource {
    async fn subscribe(&self) -> SyncResult<mpsc::Receiver<ContainerEvent>> {
        let (tx, rx) = mpsc::channel(256);
        let docker = self.docker.clone();

        tokio::spawn(async move {
            let options = EventsOptionsBuilder::new()
                .filters(&HashMap::from([(
                    "type".to_string(),
                    vec!["container".to_string()],
                )]))
                .build();
            let mut stream = docker.events(Some(options));

            while let Some(result) = stream.next().await {
                let message = match result {
                    Ok(message) => message,
                    Err(err) => {
                        tracing::warn!(error = %err, "docker event stream error");
                        continue;
                    }
                };

                let Some(action) = message.action.as_deref() else {
                    continue;
                };
                let kind = match action {
                    "start" => ContainerEventKind::Started,
                    "die" | "stop" | "kill" | "destroy" => ContainerEventKind::Stopped,
                    _ => continue,
                };

                let Some(actor) = message.actor else {
                    continue;
                };
                let container_id = actor.id.unwrap_or_default();
                let labels = actor.attributes.unwrap_or_default();
                let container_name = Self::container_name(&labels, &container_id);

                // Only started containers need an IP looked up; a stopped
                // container's address no longer matters.
                let ip_address = if kind == ContainerEventKind::Started {
                    Self::fetch_ip_address(&docker, &container_id).await
                } else {
                    None
                };

                let event = ContainerEvent {
                    kind,
                    container_id,
                    container_name,
                    labels,
                    ip_address,
                };

                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok(rx)
    }

    async fn stop(&self) {
        // The background task exits on its own once the receiver is dropped;
        // nothing to tear down on the client handle itself.
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod events_tests;
