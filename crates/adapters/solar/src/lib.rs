//! # sunfade-adapter-solar
//!
//! Astronomy adapter: computes today's sunrise and sunset for the configured
//! coordinates using the sunrise equation, with "today" taken in the local
//! timezone.
//!
//! The timezone is resolved once at construction, either from an explicit
//! IANA name or, failing that, from the longitude.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `sunfade-app` and `sunfade-domain`.

mod equation;
mod zone;

pub use equation::sun_times;
pub use zone::LocalZone;

use sunfade_app::ports::Astronomy;
use sunfade_domain::error::ValidationError;
use sunfade_domain::geo::Coordinates;
use sunfade_domain::schedule::SunTimes;
use sunfade_domain::time::Timestamp;

/// Sun times for a fixed location.
#[derive(Debug, Clone, Copy)]
pub struct SolarCalculator {
    coords: Coordinates,
    zone: LocalZone,
}

impl SolarCalculator {
    /// Resolve the local zone and build the calculator.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownTimezone`] if `timezone` is given but
    /// is not an IANA zone name.
    pub fn new(coords: Coordinates, timezone: Option<&str>) -> Result<Self, ValidationError> {
        let zone = LocalZone::resolve(coords, timezone)?;
        tracing::info!(
            latitude = coords.latitude(),
            longitude = coords.longitude(),
            %zone,
            "solar calculator ready"
        );
        Ok(Self { coords, zone })
    }

    #[must_use]
    pub fn zone(&self) -> LocalZone {
        self.zone
    }
}

impl Astronomy for SolarCalculator {
    fn sun_times(&self, now: Timestamp) -> SunTimes {
        let date = self.zone.local_date(now);
        let times = equation::sun_times(date, self.coords);
        tracing::trace!(%date, ?times, "computed sun times");
        times
    }
}
