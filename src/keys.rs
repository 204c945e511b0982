//! Key normalization for JSON produced by the AWS CLI.

use heck::ToSnakeCase;
use serde_json::{Map, Value};

/// Recursively rewrites every object key to snake_case.
///
/// The CLI prints API shapes with PascalCase keys (`AccessKeyId`); the crate's
/// types use snake_case field names. Arrays are traversed, scalar values are
/// left untouched.
///
/// ```
/// use aws_mfa_secure::keys::snake_case_keys;
/// use serde_json::json;
///
/// let out = snake_case_keys(json!({"Credentials": {"AccessKeyId": "AKIA"}}));
/// assert_eq!(out, json!({"credentials": {"access_key_id": "AKIA"}}));
/// ```
pub fn snake_case_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key.to_snake_case(), snake_case_keys(value)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(snake_case_keys).collect()),
        scalar => scalar,
    }
}
