//! Notifier port: delivers user-facing alerts.
//!
//! Rate limiting is not the notifier's job; see
//! [`NotificationGate`](crate::services::notification_gate::NotificationGate).

use std::future::Future;

use sunfade_domain::error::SunfadeError;

/// Sends a short text alert to the user.
pub trait Notifier: Send + Sync {
    /// Deliver `message`.
    fn notify(&self, message: &str) -> impl Future<Output = Result<(), SunfadeError>> + Send;
}

impl<T: Notifier> Notifier for std::sync::Arc<T> {
    fn notify(&self, message: &str) -> impl Future<Output = Result<(), SunfadeError>> + Send {
        (**self).notify(message)
    }
}
