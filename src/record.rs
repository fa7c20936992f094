// SPDX-License-Identifier: MIT

//! DNS record types and the intents derived from running containers.

use serde::{Deserialize, Serialize};

/// The DNS record types this daemon knows how to synchronize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Cname,
}

impl RecordType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Cname => "CNAME",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A desired DNS record, derived from one running container, that this host wants
/// registered on its behalf.
///
/// `name` is the fully qualified DNS name (e.g. `web.local`); `host` is the value
/// the record should resolve to (an IP address for `A`, a DNS name for `CNAME`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordIntent {
    pub name: String,
    pub record_type: RecordType,
    pub host: String,
    pub owner_hostname: String,
    pub owner_container_name: String,
}

impl RecordIntent {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        record_type: RecordType,
        host: impl Into<String>,
        owner_hostname: impl Into<String>,
        owner_container_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            host: host.into(),
            owner_hostname: owner_hostname.into(),
            owner_container_name: owner_container_name.into(),
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
