//! Dimmer port: commands understood by a network dimmer.
//!
//! Implementations speak the device's wire protocol; the sync loop only ever
//! calls these four operations. All of them are expected to be idempotent:
//! sending the same command twice leaves the device as sending it once.

use std::future::Future;

use sunfade_domain::brightness::Brightness;
use sunfade_domain::dimmer::{DimmerAddress, DimmerState};
use sunfade_domain::error::DeviceError;

/// Client for a family of network dimmers.
pub trait DimmerClient: Send + Sync {
    /// Query the device's live on/off state and brightness.
    fn refresh(
        &self,
        address: &DimmerAddress,
    ) -> impl Future<Output = Result<DimmerState, DeviceError>> + Send;

    /// Switch the relay on.
    fn power_on(
        &self,
        address: &DimmerAddress,
    ) -> impl Future<Output = Result<(), DeviceError>> + Send;

    /// Switch the relay off.
    fn power_off(
        &self,
        address: &DimmerAddress,
    ) -> impl Future<Output = Result<(), DeviceError>> + Send;

    /// Set the dimmer level. Does not change the relay state.
    fn set_brightness(
        &self,
        address: &DimmerAddress,
        level: Brightness,
    ) -> impl Future<Output = Result<(), DeviceError>> + Send;
}

impl<T: DimmerClient> DimmerClient for std::sync::Arc<T> {
    fn refresh(
        &self,
        address: &DimmerAddress,
    ) -> impl Future<Output = Result<DimmerState, DeviceError>> + Send {
        (**self).refresh(address)
    }

    fn power_on(
        &self,
        address: &DimmerAddress,
    ) -> impl Future<Output = Result<(), DeviceError>> + Send {
        (**self).power_on(address)
    }

    fn power_off(
        &self,
        address: &DimmerAddress,
    ) -> impl Future<Output = Result<(), DeviceError>> + Send {
        (**self).power_off(address)
    }

    fn set_brightness(
        &self,
        address: &DimmerAddress,
        level: Brightness,
    ) -> impl Future<Output = Result<(), DeviceError>> + Send {
        (**self).set_brightness(address, level)
    }
}
