//! # sunfade-adapter-virtual
//!
//! Virtual dimmer integration that simulates one dimmer per configured
//! address, for dry runs and tests.
//!
//! Every dimmer starts off at 0 % and reachable. Reachability can be toggled
//! at runtime to exercise the sync loop's failure isolation.
//!
//! ## Dependency rule
//!
//! Depends on `sunfade-app` (port traits) and `sunfade-domain` only.

mod dimmer;

pub use dimmer::VirtualDimmer;

use std::collections::HashMap;

use sunfade_app::ports::DimmerClient;
use sunfade_domain::brightness::Brightness;
use sunfade_domain::dimmer::{DimmerAddress, DimmerState};
use sunfade_domain::error::DeviceError;

/// Why a virtual dimmer did not answer.
#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    #[error("no virtual dimmer at {0}")]
    UnknownAddress(DimmerAddress),
    #[error("virtual dimmer {0} is offline")]
    Offline(DimmerAddress),
}

impl From<VirtualError> for DeviceError {
    fn from(err: VirtualError) -> Self {
        DeviceError::Unreachable(Box::new(err))
    }
}

/// A fixed set of simulated dimmers keyed by address.
pub struct VirtualDimmers {
    devices: HashMap<DimmerAddress, VirtualDimmer>,
}

impl VirtualDimmers {
    /// One virtual dimmer per address.
    #[must_use]
    pub fn new(addresses: impl IntoIterator<Item = DimmerAddress>) -> Self {
        let devices = addresses
            .into_iter()
            .map(|address| (address, VirtualDimmer::default()))
            .collect();
        Self { devices }
    }

    /// Look up a dimmer for inspection or fault injection.
    #[must_use]
    pub fn get(&self, address: &DimmerAddress) -> Option<&VirtualDimmer> {
        self.devices.get(address)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    fn reachable(&self, address: &DimmerAddress) -> Result<&VirtualDimmer, VirtualError> {
        let dimmer = self
            .devices
            .get(address)
            .ok_or_else(|| VirtualError::UnknownAddress(address.clone()))?;
        if !dimmer.is_reachable() {
            return Err(VirtualError::Offline(address.clone()));
        }
        Ok(dimmer)
    }
}

impl DimmerClient for VirtualDimmers {
    async fn refresh(&self, address: &DimmerAddress) -> Result<DimmerState, DeviceError> {
        Ok(self.reachable(address)?.state())
    }

    async fn power_on(&self, address: &DimmerAddress) -> Result<(), DeviceError> {
        tracing::debug!(%address, "virtual dimmer on");
        self.reachable(address)?.power(true);
        Ok(())
    }

    async fn power_off(&self, address: &DimmerAddress) -> Result<(), DeviceError> {
        tracing::debug!(%address, "virtual dimmer off");
        self.reachable(address)?.power(false);
        Ok(())
    }

    async fn set_brightness(
        &self,
        address: &DimmerAddress,
        level: Brightness,
    ) -> Result<(), DeviceError> {
        tracing::debug!(%address, %level, "virtual dimmer level");
        self.reachable(address)?.set_brightness(level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(last: u8) -> DimmerAddress {
        DimmerAddress::new(format!("10.0.0.{last}")).unwrap()
    }

    fn dimmers() -> VirtualDimmers {
        VirtualDimmers::new([address(1), address(2)])
    }

    #[test]
    fn should_create_one_dimmer_per_address() {
        let dimmers = dimmers();
        assert_eq!(dimmers.len(), 2);
        assert!(!dimmers.is_empty());
        assert!(dimmers.get(&address(1)).is_some());
        assert!(dimmers.get(&address(3)).is_none());
    }

    #[tokio::test]
    async fn should_refresh_initial_state() {
        let state = dimmers().refresh(&address(1)).await.unwrap();
        assert!(!state.is_on);
        assert_eq!(state.brightness, Brightness::OFF);
    }

    #[tokio::test]
    async fn should_apply_power_and_level() {
        let dimmers = dimmers();
        let level = Brightness::new(30).unwrap();
        dimmers.power_on(&address(2)).await.unwrap();
        dimmers.set_brightness(&address(2), level).await.unwrap();

        let state = dimmers.refresh(&address(2)).await.unwrap();
        assert!(state.matches(level));
        // the other dimmer is untouched
        assert!(dimmers.refresh(&address(1)).await.unwrap().matches(Brightness::OFF));
    }

    #[tokio::test]
    async fn should_be_idempotent() {
        let dimmers = dimmers();
        let level = Brightness::new(70).unwrap();
        dimmers.set_brightness(&address(1), level).await.unwrap();
        let once = dimmers.refresh(&address(1)).await.unwrap();
        dimmers.set_brightness(&address(1), level).await.unwrap();
        let twice = dimmers.refresh(&address(1)).await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn should_report_offline_dimmer_as_unreachable() {
        let dimmers = dimmers();
        dimmers.get(&address(1)).unwrap().set_reachable(false);

        let err = dimmers.refresh(&address(1)).await.unwrap_err();
        assert!(err.is_unreachable());
        assert!(dimmers.power_off(&address(1)).await.is_err());
        assert!(dimmers.refresh(&address(2)).await.is_ok());
    }

    #[tokio::test]
    async fn should_report_unknown_address_as_unreachable() {
        let err = dimmers().power_on(&address(9)).await.unwrap_err();
        assert!(err.is_unreachable());
    }

    #[test]
    fn should_display_offline_error() {
        let err = VirtualError::Offline(address(4));
        assert_eq!(err.to_string(), "virtual dimmer 10.0.0.4 is offline");
    }
}
