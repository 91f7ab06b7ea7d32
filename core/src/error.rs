//! Error types for the ticketing API client.
//!
//! # Design
//! Every dispatched request ends in exactly one `Result<_, ApiError>`.
//! Variants map to where the call failed: before the network (`Rejected`,
//! `Serialization`), at the network (`Network`), inside a well-formed
//! response (`Application`), or on a non-2xx status (`AuthRequired`, `Http`,
//! `Server`). `Decode` covers payloads that do not have the expected shape.
//!
//! `Application` and `Server` display as the bare server message so callers
//! can show it to the user as-is.

use thiserror::Error;

/// Failures surfaced by `ApiClient`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No usable response: connect, DNS, timeout or reset.
    #[error("network error: {0}")]
    Network(String),

    /// A request interceptor refused to send the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response envelope carried a non-zero application code.
    #[error("{message}")]
    Application { code: i64, message: String },

    /// The server answered with the configured auth-failure status.
    #[error("authentication required (HTTP {status})")]
    AuthRequired { status: u16 },

    /// Non-2xx status on a JSON request.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Non-2xx status on a binary request, with the error body decoded to text.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The response did not have the expected shape, or could not be read.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status attached to the failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthRequired { status }
            | ApiError::Http { status, .. }
            | ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Network(msg)
            | ApiError::Rejected(msg)
            | ApiError::Serialization(msg)
            | ApiError::Decode(msg) => msg,
            ApiError::Application { message, .. } | ApiError::Server { message, .. } => message,
            ApiError::Http { body, .. } => body,
            ApiError::AuthRequired { .. } => "authentication required",
        }
    }
}

/// Failures reported by a `Transport` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Nothing came back from the server.
    #[error("{0}")]
    Network(String),

    /// A status line arrived but the body could not be read.
    #[error("failed to read response body (HTTP {status}): {message}")]
    BodyRead {
        status: u16,
        headers: Vec<(String, String)>,
        message: String,
    },
}
