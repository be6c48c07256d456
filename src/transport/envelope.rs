//! Response envelope handling.
//!
//! Successful responses may wrap their payload as `{ "data": ... }` or return
//! it bare. Error responses describe the failure in `message` or `error`.

use serde_json::Value;

use crate::error::Result;

/// Decode a success body. Empty bodies (204 and friends) decode as `null`.
pub fn decode_success(bytes: &[u8]) -> Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(bytes)?)
}

/// Decode an error body, keeping non-JSON text as a JSON string.
pub fn decode_error(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Return the nested `data` field when present, otherwise the whole payload.
pub fn unwrap_data(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
