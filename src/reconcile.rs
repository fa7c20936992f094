// SPDX-License-Identifier: MIT

//! Pure diffing logic between desired and actual record state.

use crate::record::{RecordIntent, RecordType};
use std::collections::HashMap;

/// The result of diffing desired state against what this host currently owns
/// in the registry.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub to_add: Vec<RecordIntent>,
    pub to_remove: Vec<RecordIntent>,
}

/// Identity used for matching: the record's name and type. Ownership metadata
/// does not participate in equality, only in which `actual` records are
/// visible to this function (the caller pre-filters `actual` to this host).
fn key(intent: &RecordIntent) -> (String, RecordType) {
    (intent.name.clone(), intent.record_type)
}

/// Equality used for deciding whether an existing record still matches what's
/// desired: name, type, and value. Owner metadata is excluded so a container
/// restart that gets a fresh ID but keeps the same name/value is a no-op.
fn same_value(a: &RecordIntent, b: &RecordIntent) -> bool {
    a.name == b.name && a.record_type == b.record_type && a.host == b.host
}

/// Diff `desired` (this host's currently wanted intents) against `actual`
/// (records this host owns, as last observed in the registry).
///
/// `actual` must already be filtered to this host's own records; reconcile
/// never touches records owned by another host. A name/type pair whose value
/// changed (e.g. the container's IP moved) is treated as a remove-then-add so
/// the registry always reflects exactly one value per owned name.
#[must_use]
pub fn reconcile(desired: &[RecordIntent], actual: &[RecordIntent]) -> ReconcileOutcome {
    let desired_by_key: HashMap<(String, RecordType), &RecordIntent> =
        desired.iter().map(|intent| (key(intent), intent)).collect();
    let actual_by_key: HashMap<(String, RecordType), &RecordIntent> =
        actual.iter().map(|intent| (key(intent), intent)).collect();

    let mut to_add = Vec::new();
    let mut to_remove = Vec::new();

    for (k, intent) in &desired_by_key {
        match actual_by_key.get(k) {
            Some(existing) if same_value(existing, intent) => {}
            Some(existing) => {
                to_remove.push((*existing).clone());
                to_add.push((*intent).clone());
            }
            None => to_add.push((*intent).clone()),
        }
    }

    for (k, intent) in &actual_by_key {
        if !desired_by_key.contains_key(k) {
            to_remove.push((*intent).clone());
        }
    }

    ReconcileOutcome { to_add, to_remove }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod reconcile_tests;
