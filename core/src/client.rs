//! Dispatch of typed endpoints through the interceptor chain.
//!
//! # Design
//! `ApiClient` owns a base URL, a `Transport` and an `InterceptorChain`, and
//! carries no per-request state. `send` runs one request through
//! request interceptors, the transport and the response side, and always
//! resolves to exactly one `Result`:
//!
//! - transport produced nothing: `ApiError::Network`, response side skipped;
//! - 2xx whose body could not be read: `ApiError::Decode`, reported as a
//!   failure;
//! - 2xx: response interceptors in order (envelope unwrapping lives there);
//! - any other status: the failure is classified (auth sentinel, decoded
//!   binary error, plain HTTP error), reported to every response
//!   interceptor's `on_failure`, then returned.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::blob;
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::{ApiError, TransportError};
use crate::http::{HttpRequest, HttpResponse, ResponseKind};
use crate::interceptor::{
    AuthRedirect, AuthToken, DefaultHeaders, InterceptorChain, RequestInterceptor,
    ResponseInterceptor, UnwrapEnvelope,
};
use crate::notify::{Navigator, Notifier, TracingNavigator, TracingNotifier};
use crate::session::{SessionClear, TokenSource};
use crate::transport::{Transport, UreqTransport};

pub struct ApiClient<T = UreqTransport> {
    base_url: String,
    auth_failure_status: u16,
    transport: T,
    chain: InterceptorChain,
}

impl ApiClient<UreqTransport> {
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }
}

impl<T: Transport> ApiClient<T> {
    /// A client with an empty interceptor chain: no envelope unwrapping, no
    /// notifications.
    pub fn bare(base_url: &str, auth_failure_status: u16, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_failure_status,
            transport,
            chain: InterceptorChain::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn chain(&self) -> &InterceptorChain {
        &self.chain
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Dispatch `endpoint` and decode its payload.
    pub fn call<R>(&self, endpoint: Endpoint<R>) -> Result<R, ApiError> {
        let (request, decode) = endpoint.into_parts();
        let response = self.send(request)?;
        decode(response)
    }

    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let request = self.chain.apply_request(request)?;
        let url = self.url_for(&request.path);
        debug!(method = request.method.as_str(), %url, "dispatching request");

        match self.transport.execute(&url, &request) {
            Ok(response) if response.is_success() => {
                debug!(status = response.status, bytes = response.body.len(), "response received");
                self.chain.apply_response(&request, response)
            }
            Ok(response) => {
                let error = self.classify_failure(&request, response.status, Some(&response.body));
                self.fail(&request, error)
            }
            Err(TransportError::BodyRead {
                status, message, ..
            }) if !(200..300).contains(&status) => {
                debug!(status, %message, "failure body unreadable");
                let error = self.classify_failure(&request, status, None);
                self.fail(&request, error)
            }
            Err(TransportError::BodyRead {
                status, message, ..
            }) => {
                warn!(status, %message, "success body unreadable");
                self.fail(
                    &request,
                    ApiError::Decode(format!("could not read response body: {message}")),
                )
            }
            Err(e) => {
                warn!(method = request.method.as_str(), %url, error = %e, "network failure");
                Err(ApiError::Network(e.to_string()))
            }
        }
    }

    fn classify_failure(
        &self,
        request: &HttpRequest,
        status: u16,
        body: Option<&[u8]>,
    ) -> ApiError {
        if status == self.auth_failure_status {
            return ApiError::AuthRequired { status };
        }
        match request.response_kind {
            ResponseKind::Binary => blob::decode_error(status, body),
            ResponseKind::Json => ApiError::Http {
                status,
                body: body
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .unwrap_or_default(),
            },
        }
    }

    fn fail(&self, request: &HttpRequest, error: ApiError) -> Result<HttpResponse, ApiError> {
        self.chain.report_failure(request, &error);
        Err(error)
    }
}

/// Assembles an `ApiClient` with the platform's standard chain:
///
/// - request: default headers, then the session token (if a source is set),
///   then any extra interceptors;
/// - response: envelope unwrapping, auth redirect, then any extras.
pub struct ApiClientBuilder {
    config: ClientConfig,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    session: Option<Arc<dyn SessionClear>>,
    token_source: Option<Arc<dyn TokenSource>>,
    extra_request: Vec<Box<dyn RequestInterceptor>>,
    extra_response: Vec<Box<dyn ResponseInterceptor>>,
}

impl ApiClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            notifier: Arc::new(TracingNotifier),
            navigator: Arc::new(TracingNavigator),
            session: None,
            token_source: None,
            extra_request: Vec::new(),
            extra_response: Vec::new(),
        }
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Session cleared when the server reports the caller is not logged in.
    pub fn session(mut self, session: Arc<dyn SessionClear>) -> Self {
        self.session = Some(session);
        self
    }

    /// Where the `Authorization` header comes from.
    pub fn token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    pub fn request_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.extra_request.push(Box::new(interceptor));
        self
    }

    pub fn response_interceptor(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.extra_response.push(Box::new(interceptor));
        self
    }

    pub fn build(self) -> ApiClient<UreqTransport> {
        let transport =
            UreqTransport::new(self.config.timeout()).with_body_limit(self.config.max_body_bytes);
        self.build_with(transport)
    }

    pub fn build_with<T: Transport>(self, transport: T) -> ApiClient<T> {
        let mut chain = InterceptorChain::new();
        chain.push_request(
            DefaultHeaders::new().with("user-agent", self.config.user_agent.clone()),
        );
        if let Some(source) = self.token_source {
            chain.push_request(AuthToken::new(source));
        }
        for interceptor in self.extra_request {
            chain.push_request_boxed(interceptor);
        }

        chain.push_response(UnwrapEnvelope::new(self.notifier.clone()));
        let mut redirect =
            AuthRedirect::new(self.notifier, self.navigator, self.config.login_route.clone());
        if let Some(session) = self.session {
            redirect = redirect.clearing(session);
        }
        chain.push_response(redirect);
        for interceptor in self.extra_response {
            chain.push_response_boxed(interceptor);
        }

        let mut client = ApiClient::bare(
            &self.config.base_url,
            self.config.auth_failure_status,
            transport,
        );
        client.chain = chain;
        client
    }
}
