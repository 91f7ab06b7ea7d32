//! Typed API client core for the movie ticketing platform.
//!
//! # Overview
//! Endpoint bindings (`api`) build typed request descriptors. `ApiClient`
//! runs them through an ordered interceptor chain and a pluggable
//! `Transport`, and resolves every call to exactly one `Result`.
//!
//! # Design
//! - `ApiClient` holds no per-request state; the only shared mutable state is
//!   the `SessionStore`, passed in explicitly.
//! - The platform envelope `{code, message, data}` is unwrapped by a response
//!   interceptor; non-zero codes become `ApiError::Application`.
//! - The auth-failure status triggers a notification, clears the session and
//!   asks the `Navigator` for the login route.
//! - Binary endpoints get their error bodies decoded to readable messages.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod blob;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod multipart;
pub mod notify;
pub mod session;
pub mod transport;
pub mod types;

pub use client::{ApiClient, ApiClientBuilder};
pub use config::{ClientConfig, ConfigError};
pub use endpoint::{Download, Endpoint};
pub use envelope::ApiEnvelope;
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestBody, ResponseKind};
pub use interceptor::{InterceptorChain, RequestInterceptor, ResponseInterceptor};
pub use multipart::{EncodedForm, Multipart};
pub use notify::{Navigator, Notifier};
pub use session::{
    JsonFilePersistence, MemoryPersistence, SessionError, SessionPersistence, SessionStore,
};
pub use transport::{Transport, UreqTransport};
pub use types::*;
