//! Kasa adapter error types.

use std::time::Duration;

use sunfade_domain::error::{DeviceError, ValidationError};

/// Errors specific to the Kasa adapter.
#[derive(Debug, thiserror::Error)]
pub enum KasaError {
    /// TCP connection could not be established.
    #[error("failed to connect to {endpoint}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// The connection broke mid-exchange.
    #[error("I/O error while talking to device")]
    Io(#[source] std::io::Error),

    /// The device did not answer in time.
    #[error("no answer within {0:?}")]
    Timeout(Duration),

    /// The device announced a response larger than allowed.
    #[error("response frame of {0} bytes exceeds limit")]
    FrameTooLarge(u32),

    /// The response was not valid JSON.
    #[error("malformed JSON response")]
    Json(#[source] serde_json::Error),

    /// The device answered with a non-zero error code.
    #[error("device rejected {method} with err_code {code}")]
    Rejected { method: &'static str, code: i64 },

    /// A required field was absent from the response.
    #[error("response is missing {0}")]
    MissingField(&'static str),

    /// The power strip has no such outlet.
    #[error("power strip has no outlet {0}")]
    OutletOutOfRange(u8),

    /// A value reported by the device failed domain validation.
    #[error("invalid value reported by device")]
    Domain(#[source] ValidationError),
}

impl KasaError {
    /// Whether this failure means the device could not be reached at all.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::Io(_) | Self::Timeout(_))
    }
}

impl From<KasaError> for DeviceError {
    fn from(err: KasaError) -> Self {
        if err.is_unreachable() {
            Self::Unreachable(Box::new(err))
        } else {
            Self::Protocol(Box::new(err))
        }
    }
}
