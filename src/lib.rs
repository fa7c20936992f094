// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # dns-sync
//!
//! A sidecar daemon that watches containers running on a host and keeps the
//! DNS records they imply synchronized into a shared etcd registry, so other
//! hosts sharing that registry can resolve them.
//!
//! ## Overview
//!
//! Each host runs one instance of this daemon. It watches the local
//! container runtime for start/stop events, derives DNS record intents from
//! opted-in containers, and reconciles those intents against etcd under a
//! short-lived distributed lock so concurrent writers from other hosts never
//! race on the same keys.
//!
//! ## Modules
//!
//! - [`config`] - Process configuration, loaded from the environment
//! - [`constants`] - Shared numeric and string constants
//! - [`derive`] - Turns container events into desired DNS record intents
//! - [`errors`] - The [`errors::SyncError`] composite error type
//! - [`events`] - Container lifecycle events and their sources
//! - [`metrics`] - Prometheus metrics
//! - [`reconcile`] - Pure diffing between desired and actual record state
//! - [`record`] - DNS record and intent types
//! - [`registry`] - The durable registry trait and its backends
//! - [`state`] - In-process tracker of desired record intents
//! - [`sync_engine`] - The control loop wiring the above together
//!
//! ## Example
//!
//! ```rust,no_run
//! use dns_sync::config::Settings;
//!
//! let settings = Settings::from_env();
//! println!("connecting to etcd at {}", settings.etcd_endpoint());
//! ```

pub mod config;
pub mod constants;
pub mod derive;
pub mod errors;
pub mod events;
pub mod metrics;
pub mod reconcile;
pub mod record;
pub mod registry;
pub mod state;
pub mod sync_engine;
