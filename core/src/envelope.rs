//! The platform's application-level response envelope.
//!
//! Every JSON endpoint answers `{"code": 0, "message": "...", "data": ...}`.
//! `code == 0` is success; anything else is an application error carrying
//! `message`. Bodies are validated against this shape before use.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Message used when a failure arrives without a usable server message.
pub const SERVICE_ERROR_MESSAGE: &str = "service error";

/// Application code that signals success.
pub const SUCCESS_CODE: i64 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl ApiEnvelope {
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::Decode(format!("malformed response envelope: {e}")))
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Unwrap the payload, or turn a non-zero code into `ApiError::Application`.
    pub fn into_data(self) -> Result<Value, ApiError> {
        if self.is_success() {
            return Ok(self.data);
        }
        let message = self
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| SERVICE_ERROR_MESSAGE.to_string());
        Err(ApiError::Application {
            code: self.code,
            message,
        })
    }
}
