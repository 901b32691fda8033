//! Time and timestamp helpers.

use chrono::{DateTime, TimeDelta, Utc};

/// UTC timestamp used for sun times, refresh times and notification cooldowns.
pub type Timestamp = DateTime<Utc>;

/// One civil day, used to wrap a sunset that lands before its sunrise.
pub const ONE_DAY: TimeDelta = TimeDelta::days(1);

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
