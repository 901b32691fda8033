//! Local timezone of the installation, resolved once at startup.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use chrono_tz::Tz;
use sunfade_domain::error::ValidationError;
use sunfade_domain::geo::Coordinates;
use sunfade_domain::time::Timestamp;

/// The zone used to decide which calendar day "today" is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalZone {
    /// An IANA zone, with daylight saving.
    Named(Tz),
    /// The nautical zone for the longitude: whole hours, no daylight saving.
    Nautical(FixedOffset),
}

impl LocalZone {
    /// Use `name` when given, otherwise derive the nautical zone from the
    /// longitude (`round(longitude / 15)` hours east of UTC).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownTimezone`] if `name` is not an IANA
    /// zone.
    pub fn resolve(coords: Coordinates, name: Option<&str>) -> Result<Self, ValidationError> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name
                .parse::<Tz>()
                .map(Self::Named)
                .map_err(|_| ValidationError::UnknownTimezone(name.to_string())),
            None => Ok(Self::Nautical(nautical_offset(coords.longitude()))),
        }
    }

    /// Local calendar date at `now`.
    #[must_use]
    pub fn local_date(&self, now: Timestamp) -> NaiveDate {
        match self {
            Self::Named(tz) => now.with_timezone(tz).date_naive(),
            Self::Nautical(offset) => now.with_timezone(offset).date_naive(),
        }
    }
}

impl std::fmt::Display for LocalZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(tz) => f.write_str(tz.name()),
            Self::Nautical(offset) => write!(f, "UTC{offset}"),
        }
    }
}

fn nautical_offset(longitude: f64) -> FixedOffset {
    // longitude is validated to -180..=180, so hours stay within -12..=12
    #[allow(clippy::cast_possible_truncation)]
    let hours = (longitude / 15.0).round() as i32;
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}
