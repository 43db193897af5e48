//! Canonical JSON serialization
//!
//! Artifact hashes are computed over a stable serialization: object keys
//! sorted recursively, no whitespace. Two artifacts with the same content
//! hash identically no matter the key insertion order of the maps that
//! produced them.

use serde_json::Value;

/// Serialize a JSON value deterministically.
///
/// Scalars and arrays serialize as `serde_json` would; objects emit their
/// entries in ascending key order at every nesting level.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Keys render through Value so escaping matches scalar strings.
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => {
            out.push_str(&scalar.to_string());
        }
    }
}

/// Serde helpers for U256 as a decimal string on the JSON wire
pub mod u256_decimal {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<U256>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_independent() {
        let a: Value = serde_json::from_str(r#"{"b":1,"a":{"y":2,"x":3},"c":[{"q":4,"p":5}]}"#)
            .unwrap();
        let b: Value = serde_json::from_str(r#"{"c":[{"p":5,"q":4}],"a":{"x":3,"y":2},"b":1}"#)
            .unwrap();
        assert_eq!(canonical_json(&a), canonical_json(&b));
        assert_eq!(
            canonical_json(&a),
            r#"{"a":{"x":3,"y":2},"b":1,"c":[{"p":5,"q":4}]}"#
        );
    }

    #[test]
    fn test_scalars_and_arrays() {
        assert_eq!(canonical_json(&json!(null)), "null");
        assert_eq!(canonical_json(&json!(true)), "true");
        assert_eq!(canonical_json(&json!("a\"b")), r#""a\"b""#);
        assert_eq!(canonical_json(&json!([1, "2", null])), r#"[1,"2",null]"#);
    }

    #[test]
    fn test_repeated_calls_identical() {
        let value = json!({"z": [1, 2, 3], "a": {"nested": "x"}});
        assert_eq!(canonical_json(&value), canonical_json(&value));
    }
}
