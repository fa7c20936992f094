// SPDX-License-Identifier: MIT

//! Turns container lifecycle events into desired DNS record intents.

use crate::events::ContainerEvent;
use crate::record::{RecordIntent, RecordType};

/// Decides whether, and how, a container event should become DNS record
/// intents. A container may contribute zero, one, or several records (e.g.
/// an `A` record plus a `CNAME` alias).
pub trait IntentDeriver: Send + Sync {
    /// Derive record intents from a `started` event. An empty vector means
    /// this container opted out.
    fn derive(&self, event: &ContainerEvent, hostname: &str) -> Vec<RecordIntent>;
}

/// Default policy: a container is registered only if it carries the configured
/// opt-in label, using the container name plus a fixed domain suffix as its DNS
/// name and the container's observed IP address as the `A` record target.
///
/// This is deliberately minimal, not a certified rule engine: it exists so the
/// daemon is runnable out of the box. Anything beyond this convention is
/// expected to be supplied as a custom [`IntentDeriver`].
pub struct LabelBasedIntentDeriver {
    label_key: String,
    domain_suffix: String,
}

impl LabelBasedIntentDeriver {
    #[must_use]
    pub fn new(label_key: impl Into<String>, domain_suffix: impl Into<String>) -> Self {
        Self {
            label_key: label_key.into(),
            domain_suffix: domain_suffix.into(),
        }
    }
}

impl IntentDeriver for LabelBasedIntentDeriver {
    fn derive(&self, event: &ContainerEvent, hostname: &str) -> Vec<RecordIntent> {
        let opted_in = event
            .labels
            .get(&self.label_key)
            .map(|value| value != "false")
            .unwrap_or(false);
        if !opted_in {
            return Vec::new();
        }

        let Some(ip_address) = event.ip_address.as_ref() else {
            return Vec::new();
        };
        let name = format!("{}.{}", event.container_name, self.domain_suffix);

        vec![RecordIntent::new(
            name,
            RecordType::A,
            ip_address,
            hostname,
            &event.container_name,
        )]
    }
}

#[cfg(test)]
#[path = "derive_tests.rs"]
mod derive_tests;
