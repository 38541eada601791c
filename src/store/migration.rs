//! Forward schema migrations for the persisted state document.
//!
//! Each schema revision gets one pure `vN -> vN+1` function over the raw
//! JSON value; they are applied in sequence on load, so a document written
//! by any older build deserializes into the current types without ad hoc
//! field-presence checks in the loader.

use serde_json::{json, Value};

use crate::error::{EqubError, EqubResult};

/// Schema version written by this build
pub const SCHEMA_VERSION: u32 = 3;

/// Run forward migrations until the document is at [`SCHEMA_VERSION`]
pub fn migrate(mut document: Value) -> EqubResult<Value> {
    let mut version = document
        .get("schemaVersion")
        .and_then(Value::as_u64)
        // pre-versioning documents carried a private `_version` marker
        .or_else(|| document.get("_version").and_then(Value::as_u64))
        .unwrap_or(1) as u32;

    if version > SCHEMA_VERSION {
        return Err(EqubError::Validation(format!(
            "Store document has schema version {} but this build supports up to {}",
            version, SCHEMA_VERSION
        )));
    }

    while version < SCHEMA_VERSION {
        document = match version {
            1 => migrate_v1_to_v2(document),
            2 => migrate_v2_to_v3(document),
            _ => document,
        };
        version += 1;
    }

    if let Value::Object(ref mut map) = document {
        map.remove("_version");
        map.insert("schemaVersion".to_string(), json!(SCHEMA_VERSION));
    }
    Ok(document)
}

/// v1 -> v2: array fields and per-cycle flags became mandatory.
/// Backfills contributions, payout history, members, the activity feed,
/// and the progress/celebrated pair with safe defaults.
fn migrate_v1_to_v2(mut document: Value) -> Value {
    if let Some(equbs) = document.get_mut("equbs").and_then(Value::as_array_mut) {
        for equb in equbs {
            let Some(map) = equb.as_object_mut() else {
                continue;
            };
            for field in ["members", "contributions", "payoutHistory"] {
                map.entry(field).or_insert_with(|| json!([]));
            }
            map.entry("progress").or_insert_with(|| json!("0"));
            map.entry("celebrated").or_insert_with(|| json!(false));
        }
    }
    if let Value::Object(ref mut map) = document {
        map.entry("equbs").or_insert_with(|| json!([]));
        map.entry("activity").or_insert_with(|| json!([]));
    }
    document
}

/// v2 -> v3: the payout order became a first-class id list and join codes
/// became canonically uppercase. Derives a missing order from the member
/// list and normalizes stored codes.
fn migrate_v2_to_v3(mut document: Value) -> Value {
    if let Some(equbs) = document.get_mut("equbs").and_then(Value::as_array_mut) {
        for equb in equbs {
            let Some(map) = equb.as_object_mut() else {
                continue;
            };
            let order_missing = map
                .get("payoutOrder")
                .and_then(Value::as_array)
                .map_or(true, |a| a.is_empty());
            let is_active = map.get("status").and_then(Value::as_str) == Some("active");
            if order_missing && is_active {
                let ids: Vec<Value> = map
                    .get("members")
                    .and_then(Value::as_array)
                    .map(|members| {
                        members
                            .iter()
                            .filter_map(|m| m.get("id").cloned())
                            .collect()
                    })
                    .unwrap_or_default();
                map.insert("payoutOrder".to_string(), Value::Array(ids));
            } else {
                map.entry("payoutOrder").or_insert_with(|| json!([]));
            }
            if let Some(code) = map.get("code").and_then(Value::as_str) {
                let upper = code.to_ascii_uppercase();
                map.insert("code".to_string(), json!(upper));
            }
        }
    }
    document
}
