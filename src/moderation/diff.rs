//! Field-level diffing of snapshots, single-step and multi-version.

use serde_json::Value;

use crate::moderation::snapshot::{decode_snapshot, flatten, is_skipped};

/// One differing leaf between two snapshots. Values are whitespace-trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub key: String,
    pub before: String,
    pub after: String,
}

/// Ordered, key-flattened diff of two snapshots. Audit-only keys are
/// skipped; a change is emitted only where the trimmed values differ.
pub fn build_diff(before: &Value, after: &Value) -> Vec<FieldChange> {
    let before_flat = flatten(&decode_snapshot(before));
    let after_flat = flatten(&decode_snapshot(after));

    let mut keys: Vec<&String> = before_flat.keys().chain(after_flat.keys()).collect();
    keys.sort();
    keys.dedup();

    let mut changes = Vec::new();
    for key in keys {
        if is_skipped(key) {
            continue;
        }
        let before_val = before_flat.get(key).map(|v| v.trim()).unwrap_or("");
        let after_val = after_flat.get(key).map(|v| v.trim()).unwrap_or("");
        if before_val != after_val {
            changes.push(FieldChange {
                key: key.clone(),
                before: before_val.to_string(),
                after: after_val.to_string(),
            });
        }
    }
    changes
}

/// One step of a field's history: the change introduced by `version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedChange {
    pub version: i64,
    pub before: String,
    pub after: String,
}

/// Every change a field went through across an ordered snapshot sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHistory {
    pub key: String,
    pub changes: Vec<VersionedChange>,
}

/// Accumulate per-version changes over an ordered `(version, snapshot)`
/// sequence. Each step i -> i+1 contributes tuples tagged with the target
/// version; fields with no differences across all steps are dropped.
pub fn multi_version_diff(snapshots: &[(i64, Value)]) -> Vec<FieldHistory> {
    let mut histories: Vec<FieldHistory> = Vec::new();

    for window in snapshots.windows(2) {
        let (_, before) = &window[0];
        let (version, after) = &window[1];
        for change in build_diff(before, after) {
            let idx = match histories.iter().position(|h| h.key == change.key) {
                Some(idx) => idx,
                None => {
                    histories.push(FieldHistory {
                        key: change.key.clone(),
                        changes: Vec::new(),
                    });
                    histories.len() - 1
                }
            };
            histories[idx].changes.push(VersionedChange {
                version: *version,
                before: change.before,
                after: change.after,
            });
        }
    }

    histories.sort_by(|a, b| a.key.cmp(&b.key));
    histories
}

/// Render a field history as the `value||v:<version>` presentation columns:
/// newline-joined before/after values ordered by version, changes-only.
pub fn render_history(history: &FieldHistory) -> (String, String) {
    let before = history
        .changes
        .iter()
        .map(|c| format!("{}||v:{}", c.before, c.version))
        .collect::<Vec<_>>()
        .join("\n");
    let after = history
        .changes
        .iter()
        .map(|c| format!("{}||v:{}", c.after, c.version))
        .collect::<Vec<_>>()
        .join("\n");
    (before, after)
}
