//! Ordered request/response hooks around every dispatch.
//!
//! # Design
//! Request interceptors take the descriptor by value and hand back a
//! (possibly modified) one, or reject. Response interceptors see 2xx
//! responses on the same terms. Failures with a status code are reported to
//! every response interceptor's `on_failure` for side effects only; the
//! failure itself is never altered there.
//!
//! Both phases run in registration order and stop at the first rejection.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::envelope::{ApiEnvelope, SERVICE_ERROR_MESSAGE};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, ResponseKind};
use crate::notify::{Navigator, Notifier};
use crate::session::{SessionClear, TokenSource};

/// Notification shown when the server reports the caller is not logged in.
pub const LOGIN_REQUIRED_MESSAGE: &str = "please log in";

pub trait RequestInterceptor: Send + Sync {
    fn on_request(&self, request: HttpRequest) -> Result<HttpRequest, ApiError>;
}

impl<F> RequestInterceptor for F
where
    F: Fn(HttpRequest) -> Result<HttpRequest, ApiError> + Send + Sync,
{
    fn on_request(&self, request: HttpRequest) -> Result<HttpRequest, ApiError> {
        self(request)
    }
}

pub trait ResponseInterceptor: Send + Sync {
    /// Transform or reject a 2xx response.
    fn on_response(
        &self,
        _request: &HttpRequest,
        response: HttpResponse,
    ) -> Result<HttpResponse, ApiError> {
        Ok(response)
    }

    /// Observe a non-2xx failure.
    fn on_failure(&self, _request: &HttpRequest, _error: &ApiError) {}
}

#[derive(Default)]
pub struct InterceptorChain {
    request: Vec<Box<dyn RequestInterceptor>>,
    response: Vec<Box<dyn ResponseInterceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_request(&mut self, interceptor: impl RequestInterceptor + 'static) {
        self.request.push(Box::new(interceptor));
    }

    pub fn push_response(&mut self, interceptor: impl ResponseInterceptor + 'static) {
        self.response.push(Box::new(interceptor));
    }

    pub fn push_request_boxed(&mut self, interceptor: Box<dyn RequestInterceptor>) {
        self.request.push(interceptor);
    }

    pub fn push_response_boxed(&mut self, interceptor: Box<dyn ResponseInterceptor>) {
        self.response.push(interceptor);
    }

    pub fn request_len(&self) -> usize {
        self.request.len()
    }

    pub fn response_len(&self) -> usize {
        self.response.len()
    }

    pub fn apply_request(&self, request: HttpRequest) -> Result<HttpRequest, ApiError> {
        self.request
            .iter()
            .try_fold(request, |req, interceptor| interceptor.on_request(req))
            .inspect_err(|e| debug!(error = %e, "request interceptor rejected"))
    }

    pub fn apply_response(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
    ) -> Result<HttpResponse, ApiError> {
        self.response
            .iter()
            .try_fold(response, |resp, interceptor| {
                interceptor.on_response(request, resp)
            })
    }

    pub fn report_failure(&self, request: &HttpRequest, error: &ApiError) {
        for interceptor in &self.response {
            interceptor.on_failure(request, error);
        }
    }
}

/// Stamps fixed headers on requests that do not already carry them.
#[derive(Debug, Clone, Default)]
pub struct DefaultHeaders {
    headers: Vec<(String, String)>,
}

impl DefaultHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl RequestInterceptor for DefaultHeaders {
    fn on_request(&self, mut request: HttpRequest) -> Result<HttpRequest, ApiError> {
        for (name, value) in &self.headers {
            if request.header_value(name).is_none() {
                request.headers.push((name.clone(), value.clone()));
            }
        }
        Ok(request)
    }
}

/// Adds `Authorization` from the current session when one exists.
pub struct AuthToken {
    source: Arc<dyn TokenSource>,
}

impl AuthToken {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self { source }
    }
}

impl RequestInterceptor for AuthToken {
    fn on_request(&self, mut request: HttpRequest) -> Result<HttpRequest, ApiError> {
        if request.header_value("authorization").is_none() {
            if let Some(token) = self.source.token() {
                request.headers.push(("authorization".to_string(), token));
            }
        }
        Ok(request)
    }
}

/// Unwraps `{code, message, data}` on JSON responses.
///
/// On success the response body becomes the `data` payload. A non-zero code
/// is notified once and rejected with the server message.
pub struct UnwrapEnvelope {
    notifier: Arc<dyn Notifier>,
}

impl UnwrapEnvelope {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl ResponseInterceptor for UnwrapEnvelope {
    fn on_response(
        &self,
        request: &HttpRequest,
        mut response: HttpResponse,
    ) -> Result<HttpResponse, ApiError> {
        if request.response_kind == ResponseKind::Binary {
            return Ok(response);
        }
        let envelope = ApiEnvelope::parse(&response.body)?;
        match envelope.into_data() {
            Ok(data) => {
                response.body =
                    serde_json::to_vec(&data).map_err(|e| ApiError::Decode(e.to_string()))?;
                Ok(response)
            }
            Err(err) => {
                warn!(path = %request.path, error = %err, "application error");
                self.notifier.error(err.message());
                Err(err)
            }
        }
    }
}

/// Reacts to failed calls: the auth-failure status logs the user out and
/// sends them to the login route, anything else gets a generic notice.
pub struct AuthRedirect {
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    session: Option<Arc<dyn SessionClear>>,
    login_route: String,
}

impl AuthRedirect {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            notifier,
            navigator,
            session: None,
            login_route: login_route.into(),
        }
    }

    pub fn clearing(mut self, session: Arc<dyn SessionClear>) -> Self {
        self.session = Some(session);
        self
    }
}

impl ResponseInterceptor for AuthRedirect {
    fn on_failure(&self, request: &HttpRequest, error: &ApiError) {
        match error {
            ApiError::AuthRequired { status } => {
                warn!(path = %request.path, status, "not authenticated, redirecting to login");
                self.notifier.error(LOGIN_REQUIRED_MESSAGE);
                if let Some(session) = &self.session {
                    session.clear_session();
                }
                self.navigator.navigate(&self.login_route);
            }
            _ => {
                warn!(path = %request.path, error = %error, "request failed");
                self.notifier.error(SERVICE_ERROR_MESSAGE);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        notes: Mutex<Vec<String>>,
        routes: Mutex<Vec<String>>,
    }

    impl Notifier for Recorder {
        fn error(&self, message: &str) {
            self.notes.lock().push(message.to_string());
        }
    }

    impl Navigator for Recorder {
        fn navigate(&self, route: &str) {
            self.routes.lock().push(route.to_string());
        }
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn request_chain_runs_in_order() {
        let mut chain = InterceptorChain::new();
        chain.push_request(|req: HttpRequest| -> Result<HttpRequest, ApiError> {
            Ok(req.header("x-step", "1"))
        });
        chain.push_request(|req: HttpRequest| -> Result<HttpRequest, ApiError> {
            Ok(req.header("x-step", "2"))
        });
        let req = chain.apply_request(HttpRequest::get("/api/homepage/filmList")).unwrap();
        let steps: Vec<_> = req.headers.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(steps, vec!["1", "2"]);
    }

    #[test]
    fn request_rejection_short_circuits() {
        let calls = Arc::new(Mutex::new(0));
        let seen = calls.clone();
        let mut chain = InterceptorChain::new();
        chain.push_request(|_req: HttpRequest| -> Result<HttpRequest, ApiError> {
            Err(ApiError::Rejected("offline".to_string()))
        });
        chain.push_request(move |req: HttpRequest| -> Result<HttpRequest, ApiError> {
            *seen.lock() += 1;
            Ok(req)
        });
        let err = chain.apply_request(HttpRequest::get("/")).unwrap_err();
        assert_eq!(err, ApiError::Rejected("offline".to_string()));
        assert_eq!(*calls.lock(), 0);
    }

    #[test]
    fn default_headers_do_not_override() {
        let headers = DefaultHeaders::new().with("User-Agent", "ticket-core");
        let req = headers
            .on_request(HttpRequest::get("/").header("user-agent", "custom"))
            .unwrap();
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header_value("User-Agent"), Some("custom"));

        let req = headers.on_request(HttpRequest::get("/")).unwrap();
        assert_eq!(req.header_value("user-agent"), Some("ticket-core"));
    }

    #[test]
    fn envelope_success_replaces_body_with_data() {
        let recorder = Arc::new(Recorder::default());
        let unwrap = UnwrapEnvelope::new(recorder.clone());
        let resp = unwrap
            .on_response(&HttpRequest::get("/"), ok(r#"{"code":0,"data":{"id":9}}"#))
            .unwrap();
        let data: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
        assert_eq!(data["id"], 9);
        assert!(recorder.notes.lock().is_empty());
    }

    #[test]
    fn envelope_failure_notifies_once() {
        let recorder = Arc::new(Recorder::default());
        let unwrap = UnwrapEnvelope::new(recorder.clone());
        let err = unwrap
            .on_response(&HttpRequest::get("/"), ok(r#"{"code":7,"message":"sold out"}"#))
            .unwrap_err();
        assert_eq!(err.to_string(), "sold out");
        assert_eq!(*recorder.notes.lock(), vec!["sold out".to_string()]);
    }

    #[test]
    fn envelope_skips_binary_requests() {
        let recorder = Arc::new(Recorder::default());
        let unwrap = UnwrapEnvelope::new(recorder);
        let req = HttpRequest::get("/api/export/data").expect_binary();
        let resp = unwrap.on_response(&req, ok("a,b\n1,2\n")).unwrap();
        assert_eq!(resp.body, b"a,b\n1,2\n");
    }

    #[test]
    fn auth_failure_notifies_and_navigates() {
        let recorder = Arc::new(Recorder::default());
        let redirect = AuthRedirect::new(recorder.clone(), recorder.clone(), "/login");
        redirect.on_failure(&HttpRequest::get("/"), &ApiError::AuthRequired { status: 401 });
        assert_eq!(*recorder.notes.lock(), vec![LOGIN_REQUIRED_MESSAGE.to_string()]);
        assert_eq!(*recorder.routes.lock(), vec!["/login".to_string()]);
    }

    #[test]
    fn other_failures_get_generic_notice() {
        let recorder = Arc::new(Recorder::default());
        let redirect = AuthRedirect::new(recorder.clone(), recorder.clone(), "/login");
        let err = ApiError::Http {
            status: 500,
            body: String::new(),
        };
        redirect.on_failure(&HttpRequest::get("/"), &err);
        assert_eq!(*recorder.notes.lock(), vec![SERVICE_ERROR_MESSAGE.to_string()]);
        assert!(recorder.routes.lock().is_empty());
    }
}
