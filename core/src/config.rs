//! Client configuration.
//!
//! Defaults match a locally running backend. `from_env` overlays
//! `TICKET_API_*` environment variables on top of the defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_BASE_URL: &str = "TICKET_API_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "TICKET_API_TIMEOUT_MS";
pub const ENV_AUTH_STATUS: &str = "TICKET_API_AUTH_STATUS";
pub const ENV_LOGIN_ROUTE: &str = "TICKET_API_LOGIN_ROUTE";
pub const ENV_MAX_BODY_BYTES: &str = "TICKET_API_MAX_BODY_BYTES";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Whole-request timeout in milliseconds; `0` disables it.
    pub timeout_ms: u64,
    /// HTTP status the backend uses for "not authenticated".
    pub auth_failure_status: u16,
    pub login_route: String,
    pub user_agent: String,
    /// Largest response body accepted; larger ones fail with `ApiError::Decode`.
    pub max_body_bytes: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 30_000,
            auth_failure_status: 401,
            login_route: "/login".to_string(),
            user_agent: concat!("ticket-core/", env!("CARGO_PKG_VERSION")).to_string(),
            max_body_bytes: u64::MAX,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            config.timeout_ms = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    key: ENV_TIMEOUT_MS,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(raw) = lookup(ENV_MAX_BODY_BYTES) {
            config.max_body_bytes = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    key: ENV_MAX_BODY_BYTES,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(raw) = lookup(ENV_AUTH_STATUS) {
            config.auth_failure_status = parse_status(&raw)?;
        }
        if let Some(route) = lookup(ENV_LOGIN_ROUTE) {
            config.login_route = route;
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

fn parse_status(raw: &str) -> Result<u16, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key: ENV_AUTH_STATUS,
        value: raw.to_string(),
        reason,
    };
    let status: u16 = raw.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    if !(100..=999).contains(&status) {
        return Err(invalid("not an HTTP status code".to_string()));
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn overrides_are_read() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://tickets.internal"),
            (ENV_TIMEOUT_MS, "0"),
            (ENV_AUTH_STATUS, "403"),
            (ENV_LOGIN_ROUTE, "/signin"),
            (ENV_MAX_BODY_BYTES, "1048576"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://tickets.internal");
        assert_eq!(config.timeout(), None);
        assert_eq!(config.auth_failure_status, 403);
        assert_eq!(config.login_route, "/signin");
        assert_eq!(config.max_body_bytes, 1 << 20);
    }

    #[test]
    fn out_of_range_status_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_AUTH_STATUS, "70005")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_AUTH_STATUS, .. }));
    }

    #[test]
    fn garbage_timeout_is_rejected() {
        assert!(ClientConfig::from_lookup(lookup(&[(ENV_TIMEOUT_MS, "soon")])).is_err());
    }

    #[test]
    fn partial_json_config_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"http://example.test"}"#).unwrap();
        assert_eq!(config.base_url, "http://example.test");
        assert_eq!(config.auth_failure_status, 401);
        assert_eq!(config.max_body_bytes, u64::MAX);
    }
}
