//! Outbound schema sanitization.
//!
//! Structured-output endpoints accept only a subset of JSON Schema. Strict
//! types (`deny_unknown_fields`) and exclusive numeric bounds produce
//! keywords those endpoints reject, so they are stripped before sending.
//! The strict contract is still enforced locally when the reply comes back.

use serde_json::{Map, Value};

/// Schema keywords removed by [`sanitize_schema`], in both camelCase and
/// snake_case spellings.
pub const UNSUPPORTED_SCHEMA_KEYS: [&str; 7] = [
    "$schema",
    "additionalProperties",
    "additional_properties",
    "exclusiveMinimum",
    "exclusive_minimum",
    "exclusiveMaximum",
    "exclusive_maximum",
];

/// Recursively remove [`UNSUPPORTED_SCHEMA_KEYS`] from every nested object
/// and array, leaving all other structure untouched.
///
/// # Example
///
/// ```
/// use decision_debate::output_parser::sanitize_schema;
/// use serde_json::json;
///
/// let schema = json!({
///     "type": "object",
///     "additionalProperties": false,
///     "properties": {"weight": {"type": "number", "exclusiveMinimum": 0}}
/// });
/// let clean = sanitize_schema(&schema);
/// assert_eq!(clean, json!({
///     "type": "object",
///     "properties": {"weight": {"type": "number"}}
/// }));
/// ```
pub fn sanitize_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .iter()
                .filter(|(key, _)| !UNSUPPORTED_SCHEMA_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), sanitize_schema(value)))
                .collect();
            Value::Object(cleaned)
        }
        Value::Array(items) => Value::Array(items.iter().map(sanitize_schema).collect()),
        other => other.clone(),
    }
}
