use serde_json::{Map, Value};

/// Drop every `null` from a JSON value, at any depth.
///
/// Object keys holding `null` are removed, arrays lose their `null`
/// elements (they are filtered, not replaced). Returns `None` only when the
/// value itself is `null`.
pub fn omit_nullish(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(Value::Array(
            items.into_iter().filter_map(omit_nullish).collect(),
        )),
        Value::Object(fields) => {
            let mut cleaned = Map::with_capacity(fields.len());
            for (key, field) in fields {
                if let Some(field) = omit_nullish(field) {
                    cleaned.insert(key, field);
                }
            }
            Some(Value::Object(cleaned))
        }
        other => Some(other),
    }
}

/// JSON pointers of every `null` still present in `value`.
pub fn find_null_paths(value: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_null_paths(value, String::new(), &mut paths);
    paths
}

fn collect_null_paths(value: &Value, pointer: String, out: &mut Vec<String>) {
    match value {
        Value::Null => out.push(if pointer.is_empty() {
            "/".to_string()
        } else {
            pointer
        }),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_null_paths(item, format!("{pointer}/{index}"), out);
            }
        }
        Value::Object(fields) => {
            for (key, field) in fields {
                let escaped = key.replace('~', "~0").replace('/', "~1");
                collect_null_paths(field, format!("{pointer}/{escaped}"), out);
            }
        }
        _ => {}
    }
}
