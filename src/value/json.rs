//! Structural JSON snapshot of an object graph.
//!
//! Objects get a `$id` in visiting order; later visits become `{"$ref": id}`,
//! so two graphs have equal snapshots exactly when they are structurally
//! equal with the same sharing.

use rustc_hash::FxHashMap;
use serde_json::{Map, Value as JsonValue, json};

use super::{Content, Value, format_primitive};

/// Snapshot a value as JSON.
///
/// `Bool`, `Int32` and `String` map directly; other primitives are tagged
/// `{"$kind": "Double", "$value": "<canonical text>"}` so that kinds and
/// float bits survive.
pub fn to_json(value: &Value) -> JsonValue {
    let mut ids = FxHashMap::default();
    json_with(value, &mut ids)
}

fn json_with(value: &Value, ids: &mut FxHashMap<usize, usize>) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => json!(b),
        Value::Int32(n) => json!(n),
        Value::String(s) => json!(s),
        Value::Object(object) => {
            if let Some(id) = ids.get(&object.id()) {
                return json!({ "$ref": id });
            }
            let id = ids.len();
            ids.insert(object.id(), id);

            let (ty, members, content) = object.snapshot();
            let mut map = Map::new();
            map.insert("$type".into(), json!(ty.name().to_string()));
            map.insert("$id".into(), json!(id));
            for (member, value) in ty.members().iter().zip(&members) {
                if !value.is_null() {
                    map.insert(member.name().to_string(), json_with(value, ids));
                }
            }
            match content {
                Content::None => {}
                Content::Items(items) => {
                    let items = items.iter().map(|v| json_with(v, ids)).collect();
                    map.insert("$items".into(), JsonValue::Array(items));
                }
                Content::Entries(entries) => {
                    let entries = entries
                        .iter()
                        .map(|(k, v)| JsonValue::Array(vec![json_with(k, ids), json_with(v, ids)]))
                        .collect();
                    map.insert("$entries".into(), JsonValue::Array(entries));
                }
            }
            JsonValue::Object(map)
        }
        other => {
            let kind = other.kind().map(|k| k.type_name()).unwrap_or_default();
            json!({ "$kind": kind, "$value": format_primitive(other) })
        }
    }
}
