//! Astronomy port: sunrise and sunset for the installation's location.

use sunfade_domain::schedule::SunTimes;
use sunfade_domain::time::Timestamp;

/// Source of sun times for the configured location and timezone.
pub trait Astronomy: Send + Sync {
    /// Sun times for the local calendar date containing `now`.
    ///
    /// The returned sunset may precede the sunrise; callers wrap-correct it.
    fn sun_times(&self, now: Timestamp) -> SunTimes;
}

impl<T: Astronomy> Astronomy for std::sync::Arc<T> {
    fn sun_times(&self, now: Timestamp) -> SunTimes {
        (**self).sun_times(now)
    }
}
