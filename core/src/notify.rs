//! Side-effect collaborators used by the response interceptors.
//!
//! The client never renders anything or owns a router; it reports to a
//! `Notifier` and asks a `Navigator` to move to a route. Embedders plug in
//! their UI. The defaults write to the tracing log.

use tracing::{info, warn};

/// Shows user-visible messages.
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Requests client-side navigation.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        warn!(notification = message, "user notification");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        info!(route, "navigation requested");
    }
}

impl<F> Notifier for F
where
    F: Fn(&str) + Send + Sync,
{
    fn error(&self, message: &str) {
        self(message)
    }
}
