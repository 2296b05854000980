//! Canonical keys for argument values.

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;

/// Key of an argument value: its canonical JSON.
///
/// Structurally equal arguments always produce the same key, whatever
/// order their map fields were built in. Tuples encode as arrays.
pub fn args_key<A: Serialize + ?Sized>(args: &A) -> Result<String> {
    Ok(canonical_json(&serde_json::to_value(args)?))
}

/// Serialize a `Value` canonically:
/// - Object keys sorted
/// - Array order preserved
/// - No whitespace
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
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
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
