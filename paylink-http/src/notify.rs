//! User-visible error notifications.
//!
//! A [`Notifier`] is the toast or banner surface of the host application. The
//! resolver calls it exactly once per failed resolution.

use std::sync::Arc;

/// Sink for user-visible error notifications.
pub trait Notifier: Send + Sync {
    /// Shows an error with a short title and a longer message.
    fn error(&self, title: &str, message: &str);
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn error(&self, title: &str, message: &str) {
        (**self).error(title, message);
    }
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn error(&self, title: &str, message: &str) {
        (**self).error(title, message);
    }
}

/// Emits notifications as `tracing` warnings.
///
/// Without the `telemetry` feature this notifier drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    #[cfg(feature = "telemetry")]
    fn error(&self, title: &str, message: &str) {
        tracing::warn!(target: "paylink::notify", title, message, "user notification");
    }

    #[cfg(not(feature = "telemetry"))]
    fn error(&self, _title: &str, _message: &str) {}
}

/// Drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn error(&self, _title: &str, _message: &str) {}
}
