//! The sunrise equation, accurate to about a minute at non-polar latitudes.
//!
//! Angles are in degrees unless suffixed `_rad`. Julian dates are days.

use chrono::{DateTime, Datelike, NaiveDate};
use sunfade_domain::geo::Coordinates;
use sunfade_domain::schedule::SunTimes;
use sunfade_domain::time::Timestamp;

/// Julian date of the J2000.0 epoch (2000-01-01 12:00).
const J2000: f64 = 2_451_545.0;
/// Julian date of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
/// `NaiveDate::num_days_from_ce` of 2000-01-01.
const J2000_DAYS_FROM_CE: i32 = 730_120;
/// Earth's axial tilt.
const OBLIQUITY: f64 = 23.4397;
/// Solar altitude at sunrise/sunset, including refraction and the disc radius.
const HORIZON: f64 = -0.833;

/// Sunrise and sunset around the solar noon of `date` at `coords`.
///
/// Times are UTC; the sunset may fall on the next UTC day.
#[must_use]
pub fn sun_times(date: NaiveDate, coords: Coordinates) -> SunTimes {
    let day = f64::from(date.num_days_from_ce() - J2000_DAYS_FROM_CE) + 0.0008;
    let mean_solar_time = day - coords.longitude() / 360.0;

    let anomaly = (357.5291 + 0.985_600_28 * mean_solar_time).rem_euclid(360.0);
    let anomaly_rad = anomaly.to_radians();
    let center = 1.9148 * anomaly_rad.sin()
        + 0.0200 * (2.0 * anomaly_rad).sin()
        + 0.0003 * (3.0 * anomaly_rad).sin();
    let ecliptic_longitude_rad = (anomaly + center + 180.0 + 102.9372)
        .rem_euclid(360.0)
        .to_radians();

    let transit = J2000 + mean_solar_time + 0.0053 * anomaly_rad.sin()
        - 0.0069 * (2.0 * ecliptic_longitude_rad).sin();

    let sin_declination = ecliptic_longitude_rad.sin() * OBLIQUITY.to_radians().sin();
    let cos_declination = sin_declination.asin().cos();
    let latitude_rad = coords.latitude().to_radians();
    let cos_hour_angle = (HORIZON.to_radians().sin() - latitude_rad.sin() * sin_declination)
        / (latitude_rad.cos() * cos_declination);

    if cos_hour_angle > 1.0 {
        return SunTimes::PolarNight;
    }
    if cos_hour_angle < -1.0 {
        return SunTimes::PolarDay;
    }

    let half_day = cos_hour_angle.acos().to_degrees() / 360.0;
    match (
        julian_to_timestamp(transit - half_day),
        julian_to_timestamp(transit + half_day),
    ) {
        (Some(sunrise), Some(sunset)) => SunTimes::Daylight { sunrise, sunset },
        _ => SunTimes::PolarNight,
    }
}

// |millis| is far below i64::MAX for any representable date
#[allow(clippy::cast_possible_truncation)]
fn julian_to_timestamp(julian: f64) -> Option<Timestamp> {
    let millis = ((julian - UNIX_EPOCH_JD) * 86_400_000.0).round();
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn daylight(times: SunTimes) -> (Timestamp, Timestamp) {
        match times {
            SunTimes::Daylight { sunrise, sunset } => (sunrise, sunset),
            other => panic!("expected daylight, got {other:?}"),
        }
    }

    fn assert_close(actual: Timestamp, expected: Timestamp) {
        let delta = (actual - expected).abs();
        assert!(
            delta <= TimeDelta::minutes(3),
            "{actual} is {delta} away from {expected}"
        );
    }

    #[test]
    fn should_match_j2000_day_count() {
        assert_eq!(date(2000, 1, 1).num_days_from_ce(), J2000_DAYS_FROM_CE);
    }

    #[test]
    fn should_give_twelve_hour_day_at_equator_on_equinox() {
        let coords = Coordinates::new(0.0, 0.0).unwrap();
        let (sunrise, sunset) = daylight(sun_times(date(2024, 3, 20), coords));
        assert_close(sunrise, Utc.with_ymd_and_hms(2024, 3, 20, 6, 5, 0).unwrap());
        assert_close(sunset, Utc.with_ymd_and_hms(2024, 3, 20, 18, 12, 0).unwrap());
    }

    #[test]
    fn should_put_summer_sunset_on_next_utc_day_west_of_greenwich() {
        // Charlotte, NC: 06:10 and 20:42 EDT
        let coords = Coordinates::new(35.227_085, -80.843_124).unwrap();
        let (sunrise, sunset) = daylight(sun_times(date(2024, 6, 21), coords));
        assert_close(sunrise, Utc.with_ymd_and_hms(2024, 6, 21, 10, 10, 0).unwrap());
        assert_close(sunset, Utc.with_ymd_and_hms(2024, 6, 22, 0, 42, 0).unwrap());
        assert!(sunrise < sunset);
    }

    #[test]
    fn should_give_shorter_winter_day() {
        let coords = Coordinates::new(35.227_085, -80.843_124).unwrap();
        let (sunrise, sunset) = daylight(sun_times(date(2024, 12, 21), coords));
        assert_close(sunrise, Utc.with_ymd_and_hms(2024, 12, 21, 12, 29, 0).unwrap());
        assert_close(sunset, Utc.with_ymd_and_hms(2024, 12, 21, 22, 16, 0).unwrap());
    }

    #[test]
    fn should_put_sunrise_on_previous_utc_day_east_of_greenwich() {
        // Tokyo: 04:26 and 19:01 JST
        let coords = Coordinates::new(35.68, 139.69).unwrap();
        let (sunrise, sunset) = daylight(sun_times(date(2024, 6, 21), coords));
        assert_close(sunrise, Utc.with_ymd_and_hms(2024, 6, 20, 19, 27, 0).unwrap());
        assert_close(sunset, Utc.with_ymd_and_hms(2024, 6, 21, 10, 1, 0).unwrap());
    }

    #[test]
    fn should_detect_polar_night_and_day_in_the_north() {
        let coords = Coordinates::new(80.0, 0.0).unwrap();
        assert_eq!(sun_times(date(2024, 12, 21), coords), SunTimes::PolarNight);
        assert_eq!(sun_times(date(2024, 6, 21), coords), SunTimes::PolarDay);
    }

    #[test]
    fn should_detect_polar_night_and_day_in_the_south() {
        let coords = Coordinates::new(-80.0, 0.0).unwrap();
        assert_eq!(sun_times(date(2024, 6, 21), coords), SunTimes::PolarNight);
        assert_eq!(sun_times(date(2024, 12, 21), coords), SunTimes::PolarDay);
    }
}
