//! Snapshot type and change detection.

use std::collections::HashSet;

use serde_json::Value;

/// Point-in-time mapping of field name to field value.
///
/// Values are arbitrary JSON. `Snapshot::clone()` is a deep copy of the
/// whole tree, so a captured baseline never aliases live form data.
pub type Snapshot = serde_json::Map<String, Value>;

/// Decide whether `candidate` is materially different from the last
/// persisted snapshot.
///
/// Two snapshots are equivalent iff they carry exactly the same field names
/// and every field's value serializes to the same canonical JSON string.
/// An empty candidate never counts as changed: a blank form produced
/// before the value source has real data must not be persisted.
pub fn is_changed(candidate: &Snapshot, last_saved: Option<&Snapshot>) -> bool {
    if candidate.is_empty() {
        return false;
    }

    let last = match last_saved {
        Some(last) => last,
        None => return true,
    };

    if candidate.len() != last.len() {
        return true;
    }

    // Equal sizes, so checking every candidate key covers added/removed
    // fields as well as value differences.
    candidate.iter().any(|(field, value)| match last.get(field) {
        Some(previous) => value.to_string() != previous.to_string(),
        None => true,
    })
}

/// Copy `snapshot` without the excluded fields.
pub fn without_fields(snapshot: &Snapshot, exclude: &HashSet<String>) -> Snapshot {
    if exclude.is_empty() {
        return snapshot.clone();
    }

    snapshot
        .iter()
        .filter(|(field, _)| !exclude.contains(field.as_str()))
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect()
}
