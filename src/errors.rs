// SPDX-License-Identifier: MIT

//! Composite error type for the dns-sync daemon.

use thiserror::Error;

/// Errors that can arise anywhere in the sync pipeline, from event ingestion
/// through intent derivation, reconciliation, and registry I/O.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The etcd client returned an error.
    #[error("etcd error: {0}")]
    Etcd(#[from] etcd_client::Error),

    /// The Docker Engine API client returned an error.
    #[error("docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// A stored record value failed to deserialize as JSON.
    #[error("malformed registry value at key {key}: {source}")]
    MalformedValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A registry key did not decode to a valid reversed-label DNS name.
    #[error("malformed registry key: {0}")]
    MalformedKey(String),

    /// Lock acquisition did not complete within the configured timeout.
    #[error("timed out acquiring lock(s) {keys:?} after {elapsed_secs}s")]
    LockTimeout { keys: Vec<String>, elapsed_secs: u64 },

    /// A caller tried to release a lock it no longer holds (already expired or released).
    #[error("lock {0} is not held")]
    LockNotHeld(String),

    /// The event source terminated unexpectedly.
    #[error("event source closed: {0}")]
    EventSourceClosed(String),

    /// A record carried an intent this daemon does not know how to derive or apply.
    #[error("invalid record intent: {0}")]
    InvalidIntent(String),
}

impl SyncError {
    /// Whether retrying the operation that produced this error is worthwhile.
    ///
    /// Transient errors are connectivity hiccups and lock contention; they are
    /// logged and swallowed by the sync engine's tick loop so a single bad tick
    /// doesn't bring the daemon down. Everything else indicates a bug or a
    /// data problem and is worth surfacing loudly.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Etcd(_) | Self::Docker(_) | Self::LockTimeout { .. } => true,
            Self::MalformedValue { .. }
            | Self::MalformedKey(_)
            | Self::LockNotHeld(_)
            | Self::EventSourceClosed(_)
            | Self::InvalidIntent(_) => false,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
