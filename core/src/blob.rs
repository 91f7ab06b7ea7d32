//! Decoding of error bodies returned to binary-expecting requests.
//!
//! A download endpoint that fails still answers with a JSON or text error
//! body, but the request declared it wanted bytes. These helpers turn such a
//! body back into a message a user can read.

use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;

/// Used when the body is JSON without a `message` field.
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

/// Used when the body is empty text.
pub const EMPTY_BODY_MESSAGE: &str = "export failed: server returned an unknown error";

/// Used when the body could not be read at all.
pub const UNREADABLE_BODY_MESSAGE: &str = "could not read error response";

/// Extract a human-readable message from a binary error body.
pub fn decode_error_message(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match serde_json::from_str::<Value>(&text) {
        // A bare `null` has no fields to look into, so it is treated as text.
        Ok(Value::Null) => text.into_owned(),
        Ok(json) => json
            .get("message")
            .and_then(message_text)
            .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
        Err(e) => {
            debug!(error = %e, "binary error body is not JSON, using raw text");
            if text.is_empty() {
                EMPTY_BODY_MESSAGE.to_string()
            } else {
                text.into_owned()
            }
        }
    }
}

/// A usable `message` value. Empty strings, zero, `false` and `null` count as
/// absent; other non-string values are passed on as their JSON text.
fn message_text(message: &Value) -> Option<String> {
    match message {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Array(_) | Value::Object(_) => Some(message.to_string()),
        _ => None,
    }
}

/// Build the failure for a binary request that ended with status `status`.
///
/// `body` is `None` when the transport received the status but could not read
/// the body.
pub fn decode_error(status: u16, body: Option<&[u8]>) -> ApiError {
    match body {
        Some(bytes) => ApiError::Server {
            status,
            message: decode_error_message(bytes),
        },
        None => ApiError::Decode(UNREADABLE_BODY_MESSAGE.to_string()),
    }
}
