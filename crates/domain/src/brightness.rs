//! Brightness: a dimmer level guaranteed to lie in `0..=100`.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Dimmer brightness in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Brightness(u8);

impl Brightness {
    /// Lights off.
    pub const OFF: Self = Self(0);
    /// Lights fully on.
    pub const FULL: Self = Self(100);

    /// Build a brightness, rejecting anything above 100.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BrightnessOutOfRange`] if `percent > 100`.
    pub fn new(percent: u8) -> Result<Self, ValidationError> {
        if percent > 100 {
            return Err(ValidationError::BrightnessOutOfRange(i64::from(percent)));
        }
        Ok(Self(percent))
    }

    /// Build a brightness from any integer, saturating into `0..=100`.
    #[must_use]
    pub fn clamped(percent: i64) -> Self {
        let clamped = percent.clamp(0, 100);
        Self(u8::try_from(clamped).unwrap_or(100))
    }

    /// The level as a plain percentage.
    #[must_use]
    pub fn percent(self) -> u8 {
        self.0
    }

    /// Whether this level means "power off".
    #[must_use]
    pub fn is_off(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u8> for Brightness {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Brightness> for u8 {
    fn from(value: Brightness) -> Self {
        value.0
    }
}

impl std::fmt::Display for Brightness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}
