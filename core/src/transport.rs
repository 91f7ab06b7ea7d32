//! The network boundary.
//!
//! # Design
//! `Transport` executes one fully-built request against an absolute URL and
//! reports either the raw response (any status) or why no response could be
//! used. Status interpretation belongs to `ApiClient`, so implementations
//! stay stateless and easy to substitute in tests.

use std::time::Duration;

use tracing::debug;
use ureq::typestate::{WithBody, WithoutBody};
use ureq::{Agent, Body, RequestBuilder};

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub trait Transport: Send + Sync {
    fn execute(&self, url: &str, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a `ureq` agent.
///
/// 4xx/5xx responses are returned as data rather than errors so the client
/// can run its failure handling on them.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
    body_limit: u64,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self {
            agent,
            body_limit: u64::MAX,
        }
    }

    /// Largest response body read before giving up. Unlimited by default;
    /// ureq alone would stop at 10 MiB.
    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }
}

impl Transport for UreqTransport {
    fn execute(&self, url: &str, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let body = request.body.as_ref().map(|b| b.as_bytes());
        let result = match request.method {
            HttpMethod::Get => send_without_body(prepare(self.agent.get(url), request), body),
            HttpMethod::Delete => send_without_body(prepare(self.agent.delete(url), request), body),
            HttpMethod::Post => send_with_body(prepare(self.agent.post(url), request), body),
            HttpMethod::Put => send_with_body(prepare(self.agent.put(url), request), body),
            HttpMethod::Patch => send_with_body(prepare(self.agent.patch(url), request), body),
        };

        let mut response = result.map_err(|e| {
            debug!(url, error = %e, "transport failure");
            TransportError::Network(e.to_string())
        })?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        match response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_vec()
        {
            Ok(body) => Ok(HttpResponse {
                status,
                headers,
                body,
            }),
            Err(e) => Err(TransportError::BodyRead {
                status,
                headers,
                message: e.to_string(),
            }),
        }
    }
}

fn prepare<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (key, value) in &request.query {
        builder = builder.query(key, value);
    }
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_without_body(
    builder: RequestBuilder<WithoutBody>,
    body: Option<&[u8]>,
) -> Result<ureq::http::Response<Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.force_send_body().send(bytes),
        None => builder.call(),
    }
}

fn send_with_body(
    builder: RequestBuilder<WithBody>,
    body: Option<&[u8]>,
) -> Result<ureq::http::Response<Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.send(bytes),
        None => builder.send_empty(),
    }
}
