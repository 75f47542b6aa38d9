//! Snapshot decoding and flattening. Snapshots are JSON documents captured
//! from entity rows; historical data may wrap them in one extra level of
//! string encoding and may carry `{Valid, …}` nullable wrappers around
//! scalars.

use std::collections::BTreeMap;

use serde_json::Value;

/// Audit-only keys excluded from diffs and history views.
pub const SKIP_KEYS: &[&str] = &[
    "Id",
    "ChangedBy",
    "ModeracioEstat",
    "ModeratedBy",
    "ModeratedAt",
    "ModeracioMotiu",
];

/// Unwrap a one-level string encoding: a snapshot stored as a JSON string
/// containing JSON decodes to the inner document.
pub fn decode_snapshot(raw: &Value) -> Value {
    if let Value::String(s) = raw {
        if let Ok(inner) = serde_json::from_str::<Value>(s) {
            return inner;
        }
    }
    raw.clone()
}

/// True when the flattened path belongs to an audit-only key.
pub fn is_skipped(path: &str) -> bool {
    let first = path
        .split(['.', '['])
        .next()
        .unwrap_or(path);
    SKIP_KEYS.contains(&first)
}

/// Flatten a snapshot into `dotted.path -> scalar` pairs. Arrays emit
/// `path[i]`; `{Valid, …}` wrapper objects collapse to their inner scalar
/// or the empty string.
pub fn flatten(value: &Value) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    walk("", value, &mut out);
    out
}

fn walk(prefix: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Object(map) => {
            if let Some(inner) = collapse_valid_wrapper(map) {
                out.insert(prefix.to_string(), inner);
                return;
            }
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                walk(&path, child, out);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                walk(&format!("{prefix}[{i}]"), item, out);
            }
        }
        scalar => {
            out.insert(prefix.to_string(), scalar_string(scalar));
        }
    }
}

/// `{Valid: false}` and `{Valid: true, <payload>}` objects collapse to a
/// single scalar; anything else is a plain nested object.
fn collapse_valid_wrapper(map: &serde_json::Map<String, Value>) -> Option<String> {
    let valid = map.get("Valid")?.as_bool()?;
    if map.len() > 2 {
        return None;
    }
    if !valid {
        return Some(String::new());
    }
    let inner = map.iter().find(|(key, _)| *key != "Valid").map(|(_, v)| v);
    Some(match inner {
        None => String::new(),
        Some(v) => scalar_string(v),
    })
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Tri-state string field accessor: outer `None` means the key is absent;
/// `Some(None)` means explicit null (or an invalid `{Valid:false}` wrapper).
pub fn get_field_str(snapshot: &Value, key: &str) -> Option<Option<String>> {
    let raw = snapshot.get(key)?;
    Some(field_scalar(raw).map(|v| match v {
        Value::String(s) => s.clone(),
        other => scalar_string(other),
    }))
}

/// Tri-state integer field accessor, tolerant of numeric strings.
pub fn get_field_i64(snapshot: &Value, key: &str) -> Option<Option<i64>> {
    let raw = snapshot.get(key)?;
    Some(field_scalar(raw).and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// Resolve a field value through an optional `{Valid, …}` wrapper.
/// `None` means null.
fn field_scalar(raw: &Value) -> Option<&Value> {
    match raw {
        Value::Null => None,
        Value::Object(map) => {
            let valid = map.get("Valid").and_then(Value::as_bool)?;
            if !valid {
                return None;
            }
            map.iter().find(|(key, _)| *key != "Valid").map(|(_, v)| v)
        }
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_scalars_and_nesting() {
        let flat = flatten(&json!({
            "Nom": "Girona",
            "PaisId": 1,
            "Dades": {"Habitants": 103000, "Actiu": true},
        }));
        assert_eq!(flat["Nom"], "Girona");
        assert_eq!(flat["PaisId"], "1");
        assert_eq!(flat["Dades.Habitants"], "103000");
        assert_eq!(flat["Dades.Actiu"], "true");
    }

    #[test]
    fn test_flatten_arrays_are_positional() {
        let flat = flatten(&json!({
            "Persones": [
                {"Nom": "Anna"},
                {"Nom": "Pere"},
            ]
        }));
        assert_eq!(flat["Persones[0].Nom"], "Anna");
        assert_eq!(flat["Persones[1].Nom"], "Pere");
    }

    #[test]
    fn test_valid_wrapper_collapses() {
        let flat = flatten(&json!({
            "Nom": {"Valid": true, "String": "Besalú"},
            "EntitatId": {"Valid": false},
            "Anys": {"Valid": true, "Int64": 1790},
        }));
        assert_eq!(flat["Nom"], "Besalú");
        assert_eq!(flat["EntitatId"], "");
        assert_eq!(flat["Anys"], "1790");
    }

    #[test]
    fn test_non_wrapper_object_with_valid_key_still_nests() {
        // Three keys: not a wrapper.
        let flat = flatten(&json!({
            "Camp": {"Valid": true, "String": "x", "Extra": 1},
        }));
        assert_eq!(flat["Camp.Valid"], "true");
        assert_eq!(flat["Camp.String"], "x");
        assert_eq!(flat["Camp.Extra"], "1");
    }

    #[test]
    fn test_decode_snapshot_unwraps_one_string_level() {
        let double = json!("{\"Nom\":\"A\"}");
        assert_eq!(decode_snapshot(&double), json!({"Nom": "A"}));

        // Plain documents pass through.
        let plain = json!({"Nom": "A"});
        assert_eq!(decode_snapshot(&plain), plain);

        // Non-JSON strings stay strings.
        let text = json!("not json");
        assert_eq!(decode_snapshot(&text), text);
    }

    #[test]
    fn test_is_skipped() {
        assert!(is_skipped("Id"));
        assert!(is_skipped("ModeracioEstat"));
        assert!(is_skipped("ModeratedBy"));
        assert!(!is_skipped("Nom"));
        assert!(!is_skipped("Dades.Habitants"));
    }

    #[test]
    fn test_field_accessors() {
        let snap = json!({
            "Nom": "Girona",
            "PaisId": 1,
            "RegioId": null,
            "ComarcaId": {"Valid": false},
            "ProvinciaId": {"Valid": true, "Int64": 3},
        });

        assert_eq!(get_field_str(&snap, "Nom"), Some(Some("Girona".into())));
        assert_eq!(get_field_i64(&snap, "PaisId"), Some(Some(1)));
        assert_eq!(get_field_i64(&snap, "RegioId"), Some(None));
        assert_eq!(get_field_i64(&snap, "ComarcaId"), Some(None));
        assert_eq!(get_field_i64(&snap, "ProvinciaId"), Some(Some(3)));
        assert_eq!(get_field_i64(&snap, "Absent"), None);
    }
}
