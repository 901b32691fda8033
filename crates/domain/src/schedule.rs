//! Brightness schedule: maps wall-clock time to a dimmer level.
//!
//! A day is split by four boundaries: `sunrise`, `sunrise + fade`,
//! `sunset - fade` and `sunset`. Between them the lights are off
//! ([`DayPhase::Night`]), ramp up linearly ([`DayPhase::FadingUp`]), stay at
//! full ([`DayPhase::Day`]) or ramp down ([`DayPhase::FadingDown`]).
//!
//! Nothing here is stored between cycles: the phase and level are recomputed
//! from the current time every cycle, so clock jumps (DST, NTP corrections)
//! may move the phase backwards.
//!
//! Ramp values are rounded to the nearest percent with ties to even, using
//! exact integer arithmetic on milliseconds.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::brightness::Brightness;
use crate::error::ValidationError;
use crate::time::{ONE_DAY, Timestamp};

/// Length of the linear ramp at either end of the day. Always at least 1 ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FadeWindow(TimeDelta);

impl FadeWindow {
    /// Build a fade window.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonPositiveFadeWindow`] if `duration` is
    /// shorter than one millisecond.
    pub fn new(duration: TimeDelta) -> Result<Self, ValidationError> {
        if duration.num_milliseconds() <= 0 {
            return Err(ValidationError::NonPositiveFadeWindow);
        }
        Ok(Self(duration))
    }

    /// Build a fade window from whole minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonPositiveFadeWindow`] for zero minutes.
    pub fn from_minutes(minutes: u32) -> Result<Self, ValidationError> {
        Self::new(TimeDelta::minutes(i64::from(minutes)))
    }

    /// The window length.
    #[must_use]
    pub fn duration(self) -> TimeDelta {
        self.0
    }
}

/// Position of the current time within the day's lighting schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPhase {
    Night,
    FadingUp,
    Day,
    FadingDown,
}

impl std::fmt::Display for DayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Night => f.write_str("night"),
            Self::FadingUp => f.write_str("fading_up"),
            Self::Day => f.write_str("day"),
            Self::FadingDown => f.write_str("fading_down"),
        }
    }
}

/// Sun times for one local date, as reported by the astronomy collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunTimes {
    /// The sun rises and sets on this date.
    Daylight {
        sunrise: Timestamp,
        sunset: Timestamp,
    },
    /// The sun never sets (midnight sun).
    PolarDay,
    /// The sun never rises.
    PolarNight,
}

/// Phase and level for a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub phase: DayPhase,
    pub brightness: Brightness,
}

impl SunTimes {
    /// Compute the phase and level at `now`.
    ///
    /// For [`SunTimes::Daylight`] the raw times are wrap-corrected and widened
    /// by `fade` (see [`ScheduleWindow::from_sun_times`]). Polar days are
    /// always full, polar nights always off.
    #[must_use]
    pub fn target_at(&self, now: Timestamp, fade: FadeWindow) -> Target {
        match *self {
            Self::Daylight { sunrise, sunset } => {
                ScheduleWindow::from_sun_times(sunrise, sunset, fade).target_at(now)
            }
            Self::PolarDay => Target {
                phase: DayPhase::Day,
                brightness: Brightness::FULL,
            },
            Self::PolarNight => Target {
                phase: DayPhase::Night,
                brightness: Brightness::OFF,
            },
        }
    }
}

/// Effective sunrise/sunset and fade window for one cycle.
///
/// Invariant: `sunrise <= sunset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    sunrise: Timestamp,
    sunset: Timestamp,
    fade: FadeWindow,
}

impl ScheduleWindow {
    /// Build a window from already-effective sunrise and sunset.
    ///
    /// A sunset earlier than the sunrise is moved forward by whole days.
    #[must_use]
    pub fn new(sunrise: Timestamp, sunset: Timestamp, fade: FadeWindow) -> Self {
        Self {
            sunrise,
            sunset: wrap_sunset(sunrise, sunset),
            fade,
        }
    }

    /// Build a window from raw astronomical sun times.
    ///
    /// The raw sunset is first wrap-corrected (some sun-time sources return
    /// the previous day's sunset), then both ends are widened by `fade` so
    /// that the ramps sit just outside the sunrise..sunset interval.
    #[must_use]
    pub fn from_sun_times(raw_sunrise: Timestamp, raw_sunset: Timestamp, fade: FadeWindow) -> Self {
        let raw_sunset = wrap_sunset(raw_sunrise, raw_sunset);
        Self {
            sunrise: raw_sunrise - fade.duration(),
            sunset: raw_sunset + fade.duration(),
            fade,
        }
    }

    /// Effective sunrise: the start of the ramp up.
    #[must_use]
    pub fn sunrise(&self) -> Timestamp {
        self.sunrise
    }

    /// Effective sunset: the end of the ramp down.
    #[must_use]
    pub fn sunset(&self) -> Timestamp {
        self.sunset
    }

    /// The fade window.
    #[must_use]
    pub fn fade(&self) -> FadeWindow {
        self.fade
    }

    /// Whether the two ramps overlap, leaving no full-brightness interval.
    #[must_use]
    pub fn fades_overlap(&self) -> bool {
        self.fade.duration() * 2 >= self.sunset - self.sunrise
    }

    /// Classify `now`.
    ///
    /// When the ramps overlap, the phase flips from fading up to fading down
    /// at the midpoint of the day, where the brightness peaks.
    #[must_use]
    pub fn phase_at(&self, now: Timestamp) -> DayPhase {
        let fade = self.fade.duration();
        if now <= self.sunrise || now >= self.sunset {
            DayPhase::Night
        } else if now < self.sunrise + fade && now - self.sunrise < self.sunset - now {
            DayPhase::FadingUp
        } else if now > self.sunset - fade {
            DayPhase::FadingDown
        } else {
            DayPhase::Day
        }
    }

    /// Target brightness at `now`.
    ///
    /// When the ramps overlap, the lower of the two ramps wins, which keeps
    /// the curve continuous.
    #[must_use]
    pub fn brightness_at(&self, now: Timestamp) -> Brightness {
        self.target_at(now).brightness
    }

    /// Phase and brightness at `now`.
    #[must_use]
    pub fn target_at(&self, now: Timestamp) -> Target {
        let phase = self.phase_at(now);
        let brightness = match phase {
            DayPhase::Night => Brightness::OFF,
            DayPhase::Day => Brightness::FULL,
            DayPhase::FadingUp | DayPhase::FadingDown => {
                let up = ramp(now - self.sunrise, self.fade);
                let down = ramp(self.sunset - now, self.fade);
                Brightness::clamped(up.min(down))
            }
        };
        Target { phase, brightness }
    }
}

fn wrap_sunset(sunrise: Timestamp, mut sunset: Timestamp) -> Timestamp {
    while sunset < sunrise {
        sunset += ONE_DAY;
    }
    sunset
}

/// `100 * elapsed / fade`, rounded to nearest with ties to even.
fn ramp(elapsed: TimeDelta, fade: FadeWindow) -> i64 {
    let numerator = i128::from(elapsed.num_milliseconds()) * 100;
    let denominator = i128::from(fade.duration().num_milliseconds());
    let rounded = div_round_half_even(numerator.max(0), denominator);
    i64::try_from(rounded).unwrap_or(i64::MAX)
}

/// Non-negative integer division rounding to nearest, ties to even.
fn div_round_half_even(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let twice_remainder = 2 * (numerator % denominator);
    if twice_remainder > denominator || (twice_remainder == denominator && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}
