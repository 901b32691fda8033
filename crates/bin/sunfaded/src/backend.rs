//! Runtime choice between the device families a configuration can name.

use sunfade_adapter_kasa::KasaClient;
use sunfade_adapter_virtual::VirtualDimmers;
use sunfade_app::ports::DimmerClient;
use sunfade_domain::brightness::Brightness;
use sunfade_domain::dimmer::{DimmerAddress, DimmerState};
use sunfade_domain::error::DeviceError;

/// The dimmer client selected by `[devices].backend`.
pub enum Backend {
    Kasa(KasaClient),
    Virtual(VirtualDimmers),
}

impl DimmerClient for Backend {
    async fn refresh(&self, address: &DimmerAddress) -> Result<DimmerState, DeviceError> {
        match self {
            Self::Kasa(client) => client.refresh(address).await,
            Self::Virtual(client) => client.refresh(address).await,
        }
    }

    async fn power_on(&self, address: &DimmerAddress) -> Result<(), DeviceError> {
        match self {
            Self::Kasa(client) => client.power_on(address).await,
            Self::Virtual(client) => client.power_on(address).await,
        }
    }

    async fn power_off(&self, address: &DimmerAddress) -> Result<(), DeviceError> {
        match self {
            Self::Kasa(client) => client.power_off(address).await,
            Self::Virtual(client) => client.power_off(address).await,
        }
    }

    async fn set_brightness(
        &self,
        address: &DimmerAddress,
        level: Brightness,
    ) -> Result<(), DeviceError> {
        match self {
            Self::Kasa(client) => client.set_brightness(address, level).await,
            Self::Virtual(client) => client.set_brightness(address, level).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_delegate_to_virtual_dimmers() {
        let address = DimmerAddress::new("192.168.1.161").unwrap();
        let backend = Backend::Virtual(VirtualDimmers::new([address.clone()]));

        backend.power_on(&address).await.unwrap();
        backend
            .set_brightness(&address, Brightness::new(30).unwrap())
            .await
            .unwrap();
        let state = backend.refresh(&address).await.unwrap();
        assert!(state.is_on);
        assert_eq!(state.brightness.percent(), 30);
    }

    #[tokio::test]
    async fn should_report_unknown_virtual_address_as_unreachable() {
        let backend = Backend::Virtual(VirtualDimmers::new([]));
        let address = DimmerAddress::new("10.0.0.1").unwrap();
        assert!(backend.refresh(&address).await.unwrap_err().is_unreachable());
    }
}
