//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`SunfadeError`] via `From`. Configuration problems are
//! [`ValidationError`]s and are fatal before the sync loop starts; device
//! problems are [`DeviceError`]s and are recovered per device, per cycle.

use crate::dimmer::DimmerAddress;

/// Boxed source error carried across port boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error for the sunfade workspace.
#[derive(Debug, thiserror::Error)]
pub enum SunfadeError {
    /// Invalid or incomplete configuration. Fatal at startup.
    #[error("invalid configuration")]
    Configuration(#[from] ValidationError),

    /// A single dimmer could not be refreshed or commanded.
    #[error("dimmer {address} failed")]
    Device {
        /// Address of the failing dimmer.
        address: DimmerAddress,
        /// What went wrong.
        #[source]
        source: DeviceError,
    },

    /// The notification collaborator failed to deliver an alert.
    #[error("notification delivery failed")]
    Notification(#[source] BoxError),

    /// Shutdown was requested while the loop was running.
    #[error("cancellation requested")]
    Cancelled,
}

/// Domain invariant violations, raised while building validated values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Brightness outside of `0..=100`.
    #[error("brightness {0} is outside 0..=100")]
    BrightnessOutOfRange(i64),

    /// Fade window of zero or negative length.
    #[error("fade window must be strictly positive")]
    NonPositiveFadeWindow,

    /// Latitude outside of `-90..=90` (or not finite).
    #[error("latitude {0} is outside -90..=90")]
    InvalidLatitude(f64),

    /// Longitude outside of `-180..=180` (or not finite).
    #[error("longitude {0} is outside -180..=180")]
    InvalidLongitude(f64),

    /// A dimmer address was empty or whitespace only.
    #[error("dimmer address must not be empty")]
    EmptyAddress,

    /// The same dimmer address was configured twice.
    #[error("dimmer address {0} is configured more than once")]
    DuplicateAddress(String),

    /// No dimmers configured at all.
    #[error("at least one dimmer address is required")]
    NoDimmers,

    /// Poll interval of zero.
    #[error("poll interval must be non-zero")]
    ZeroPollInterval,

    /// The timezone name is not a known IANA zone.
    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),

    /// The SMS carrier has no known email gateway.
    #[error("no SMS gateway known for carrier {0:?}")]
    UnmappedCarrier(String),

    /// A required notification setting is missing.
    #[error("missing notification setting `{0}`")]
    MissingNotificationSetting(&'static str),
}

/// Failure of a single dimmer operation.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The device did not answer (connection refused, timeout, no route).
    #[error("device unreachable")]
    Unreachable(#[source] BoxError),

    /// The device answered, but not with something we understood or accepted.
    #[error("device protocol error")]
    Protocol(#[source] BoxError),
}

impl DeviceError {
    /// Whether this failure means the device could not be reached at all.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    /// Attach the failing device's address, producing a [`SunfadeError`].
    #[must_use]
    pub fn at(self, address: DimmerAddress) -> SunfadeError {
        SunfadeError::Device {
            address,
            source: self,
        }
    }
}
