use serde_json::Value;

use crate::adapter::AdapterError;

/// A schemaless record: field name to JSON value. One field, named by the
/// store, is the designated primary key.
pub type Record = serde_json::Map<String, Value>;

/// Render a record's primary-key value into the string used for file
/// naming. Strings render bare (no JSON quotes); numbers and booleans use
/// their JSON text. A missing field, null, array, or object is rejected so
/// a record can never produce a garbage file name.
pub fn primary_key(record: &Record, field: &str) -> Result<String, AdapterError> {
    match record.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        _ => Err(AdapterError::MissingKey {
            field: field.to_string(),
        }),
    }
}
