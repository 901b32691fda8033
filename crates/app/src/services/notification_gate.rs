//! Notification gate: rate-limits user-facing alerts.
//!
//! A single "last sent" timestamp is shared by every alert source, so a burst
//! of device failures produces at most one message per cooldown. The gate is
//! owned by the sync loop and never shared, which keeps that timestamp
//! single-writer without a lock.

use chrono::TimeDelta;
use sunfade_domain::time::Timestamp;

use crate::ports::Notifier;

/// Default minimum delay between two alerts.
pub const DEFAULT_COOLDOWN: TimeDelta = TimeDelta::hours(2);

/// What happened to an alert handed to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    /// The notifier accepted the message.
    Sent,
    /// The notifier was called and failed. The cooldown still starts.
    Failed,
    /// An earlier alert is still inside its cooldown.
    Suppressed,
    /// Notifications are switched off.
    Disabled,
}

/// Cooldown-based rate limiter in front of a [`Notifier`].
pub struct NotificationGate<N> {
    notifier: Option<N>,
    cooldown: TimeDelta,
    last_sent: Option<Timestamp>,
}

impl<N> NotificationGate<N> {
    /// Gate in front of `notifier` with the given cooldown.
    pub fn new(notifier: N, cooldown: TimeDelta) -> Self {
        Self {
            notifier: Some(notifier),
            cooldown,
            last_sent: None,
        }
    }

    /// A gate that drops every alert.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            notifier: None,
            cooldown: DEFAULT_COOLDOWN,
            last_sent: None,
        }
    }

    /// Whether alerts are switched on at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    /// When the last alert went out (or was attempted).
    #[must_use]
    pub fn last_sent(&self) -> Option<Timestamp> {
        self.last_sent
    }

    /// Whether an alert at `now` would reach the notifier.
    ///
    /// A `now` earlier than the last alert means the wall clock stepped
    /// backwards; the cooldown is then treated as elapsed.
    #[must_use]
    pub fn is_open(&self, now: Timestamp) -> bool {
        self.is_enabled()
            && self
                .last_sent
                .is_none_or(|last| now < last || now - last >= self.cooldown)
    }
}

impl<N: Notifier> NotificationGate<N> {
    /// Forward `message` to the notifier unless the gate is closed.
    ///
    /// Delivery failures are logged and swallowed: an alert is best effort
    /// and must never interrupt the sync loop.
    pub async fn alert(&mut self, now: Timestamp, message: &str) -> AlertOutcome {
        if !self.is_open(now) {
            if !self.is_enabled() {
                return AlertOutcome::Disabled;
            }
            tracing::debug!(last_sent = ?self.last_sent, "alert suppressed by cooldown");
            return AlertOutcome::Suppressed;
        }
        let Some(notifier) = self.notifier.as_ref() else {
            return AlertOutcome::Disabled;
        };

        self.last_sent = Some(now);
        match notifier.notify(message).await {
            Ok(()) => {
                tracing::info!("alert sent");
                AlertOutcome::Sent
            }
            Err(err) => {
                tracing::warn!(%err, "failed to deliver alert");
                AlertOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use chrono::{TimeZone, Utc};
    use sunfade_domain::error::SunfadeError;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        async fn notify(&self, message: &str) -> Result<(), SunfadeError> {
            self.sent.lock().unwrap().push(message.to_string());
            if self.fail {
                return Err(SunfadeError::Notification("gateway down".into()));
            }
            Ok(())
        }
    }

    fn at(hour: u32, minute: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn should_send_first_alert() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut gate = NotificationGate::new(Arc::clone(&notifier), DEFAULT_COOLDOWN);

        let outcome = gate.alert(at(10, 0), "dimmer down").await;
        assert_eq!(outcome, AlertOutcome::Sent);
        assert_eq!(*notifier.sent.lock().unwrap(), vec!["dimmer down"]);
        assert_eq!(gate.last_sent(), Some(at(10, 0)));
    }

    #[tokio::test]
    async fn should_suppress_alerts_inside_cooldown() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut gate = NotificationGate::new(Arc::clone(&notifier), DEFAULT_COOLDOWN);

        gate.alert(at(10, 0), "first").await;
        let outcome = gate.alert(at(11, 59), "second").await;
        assert_eq!(outcome, AlertOutcome::Suppressed);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
        assert_eq!(gate.last_sent(), Some(at(10, 0)));
    }

    #[tokio::test]
    async fn should_send_again_once_cooldown_elapsed() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut gate = NotificationGate::new(Arc::clone(&notifier), DEFAULT_COOLDOWN);

        gate.alert(at(10, 0), "first").await;
        let outcome = gate.alert(at(12, 0), "second").await;
        assert_eq!(outcome, AlertOutcome::Sent);
        assert_eq!(*notifier.sent.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn should_start_cooldown_even_when_delivery_fails() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        });
        let mut gate = NotificationGate::new(Arc::clone(&notifier), DEFAULT_COOLDOWN);

        assert_eq!(gate.alert(at(10, 0), "first").await, AlertOutcome::Failed);
        assert_eq!(
            gate.alert(at(10, 30), "second").await,
            AlertOutcome::Suppressed
        );
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_reopen_when_clock_steps_backwards() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut gate = NotificationGate::new(Arc::clone(&notifier), DEFAULT_COOLDOWN);

        gate.alert(at(10, 0), "first").await;
        let outcome = gate.alert(at(9, 55), "after clock correction").await;
        assert_eq!(outcome, AlertOutcome::Sent);
        assert_eq!(gate.last_sent(), Some(at(9, 55)));

        // the cooldown restarts from the corrected time
        assert_eq!(gate.alert(at(10, 30), "third").await, AlertOutcome::Suppressed);
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn should_never_send_when_disabled() {
        let mut gate: NotificationGate<RecordingNotifier> = NotificationGate::disabled();
        assert!(!gate.is_enabled());
        assert!(!gate.is_open(at(10, 0)));
        assert_eq!(gate.alert(at(10, 0), "ignored").await, AlertOutcome::Disabled);
        assert!(gate.last_sent().is_none());
    }

    #[test]
    fn should_default_cooldown_to_two_hours() {
        assert_eq!(DEFAULT_COOLDOWN, TimeDelta::minutes(120));
    }
}
