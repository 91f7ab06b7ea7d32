//! Typed request descriptors.
//!
//! An `Endpoint<R>` pairs an `HttpRequest` with the decoder that turns the
//! normalized response into `R`. Bindings in `api` only build endpoints;
//! `ApiClient::call` dispatches them.

use std::fmt;

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

pub struct Endpoint<R> {
    request: HttpRequest,
    decode: fn(HttpResponse) -> Result<R, ApiError>,
}

impl<R> Endpoint<R> {
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// Add a header to this call only.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request = self.request.header(name, value);
        self
    }

    pub fn into_parts(self) -> (HttpRequest, fn(HttpResponse) -> Result<R, ApiError>) {
        (self.request, self.decode)
    }
}

impl<R: DeserializeOwned> Endpoint<R> {
    /// Endpoint whose unwrapped `data` payload deserializes into `R`.
    pub fn json(request: HttpRequest) -> Self {
        Self {
            request,
            decode: decode_json::<R>,
        }
    }
}

impl Endpoint<Download> {
    /// Endpoint answered with raw bytes.
    pub fn binary(request: HttpRequest) -> Self {
        Self {
            request: request.expect_binary(),
            decode: |response| Ok(Download::from(response)),
        }
    }
}

impl<R> fmt::Debug for Endpoint<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

fn decode_json<R: DeserializeOwned>(response: HttpResponse) -> Result<R, ApiError> {
    serde_json::from_slice(&response.body)
        .map_err(|e| ApiError::Decode(format!("unexpected payload: {e}")))
}

/// A successful binary response: status, headers and the full byte payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub bytes: Vec<u8>,
}

impl From<HttpResponse> for Download {
    fn from(response: HttpResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers,
            bytes: response.body,
        }
    }
}

impl Download {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// File name from `Content-Disposition`, quoted or bare.
    pub fn filename(&self) -> Option<String> {
        let disposition = self.header("content-disposition")?;
        disposition.split(';').map(str::trim).find_map(|part| {
            let value = part.strip_prefix("filename=")?;
            let value = value.trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        })
    }
}
