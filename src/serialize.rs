//! Serialization policy between typed values and the store's strings

use serde::Serialize;
use serde_json::Value;

use crate::error::CacheError;

/// Encodes a value into the store's string representation
///
/// In structured mode the value is JSON-encoded. Otherwise only
/// string-compatible values (strings, numbers, booleans) are accepted and
/// written as plain text.
pub fn encode<V>(value: &V, structured: bool) -> Result<String, CacheError>
where
    V: Serialize + ?Sized,
{
    if structured {
        return serde_json::to_string(value)
            .map_err(|e| CacheError::encode(format!("Failed to serialize cache value: {e}")));
    }

    let value = serde_json::to_value(value)
        .map_err(|e| CacheError::encode(format!("Failed to serialize cache value: {e}")))?;

    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(CacheError::encode(format!(
            "Cannot store {} value without structured serialization",
            type_name(&other)
        ))),
    }
}

/// Decodes a raw store string into a value
///
/// In structured mode the string is parsed as JSON; a string that fails to
/// parse is returned unchanged rather than treated as an error, since entries
/// may have been written as plain text (e.g. before a configuration change).
pub fn decode(raw: String, structured: bool) -> Value {
    if !structured {
        return Value::String(raw);
    }

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(_) => Value::String(raw),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
