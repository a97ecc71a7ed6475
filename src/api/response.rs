//! Response normalization.
//!
//! Every backend call passes through [`decode_response`], so callers only
//! ever see "succeeded (maybe with a body)" or an [`Error::Http`] holding a
//! display-ready message.

use super::transport::ApiResponse;
use crate::error::{Error, Result};
use serde_json::Value;
use tracing::warn;

/// Decode a raw response.
///
/// - 2xx with a JSON body → `Some(value)`
/// - 2xx with an empty body (204 included) → `None`, nothing is parsed
/// - 2xx with a body that is not JSON → `None`
/// - anything else → `Error::Http` with the message from [`error_message`]
///
/// # Errors
///
/// `Error::Http` for every non-2xx status.
pub fn decode_response(response: &ApiResponse, fallback: &str) -> Result<Option<Value>> {
    if !response.is_success() {
        return Err(Error::Http {
            status: response.status,
            message: error_message(&response.body, fallback),
        });
    }

    if response.status == 204 || response.body.trim().is_empty() {
        return Ok(None);
    }

    match serde_json::from_str(&response.body) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(status = response.status, error = %e, "Ignoring malformed response body");
            Ok(None)
        }
    }
}

/// Extract a human-readable message from an error body.
///
/// Fallback chain:
/// 1. `detail` (string as-is; any other value, validation lists included,
///    as JSON text)
/// 2. `message` (string)
/// 3. the JSON body itself, stringified
/// 4. the raw body text, unchanged, when it is not JSON
/// 5. `fallback` when the body is empty or whitespace
#[must_use]
pub fn error_message(body: &str, fallback: &str) -> String {
    if body.trim().is_empty() {
        return fallback.to_string();
    }

    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };

    if let Some(detail) = value.get("detail").filter(|d| !d.is_null()) {
        return describe_detail(detail);
    }

    if let Some(message) = value.get("message").filter(|m| !m.is_null()) {
        return match message {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    }

    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn describe_detail(detail: &Value) -> String {
    match detail {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
