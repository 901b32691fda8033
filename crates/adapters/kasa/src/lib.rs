//! # sunfade-adapter-kasa
//!
//! Drives TP-Link Kasa smart dimmers over their local TCP protocol.
//!
//! Every command is a JSON document encrypted with the Kasa autokey cipher
//! (see [`cipher`]) and sent on a fresh connection. Dimmers may optionally
//! be plugged into a Kasa power strip; when such a dimmer stops answering and
//! its outlet is off, the outlet is switched back on so the next poll can
//! reach it. Recovery runs as a detached task with its own I/O timeouts, so
//! the failed refresh returns without waiting for the strip.

pub mod cipher;
pub mod config;
pub mod error;
pub mod transport;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use sunfade_app::ports::DimmerClient;
use sunfade_domain::brightness::Brightness;
use sunfade_domain::dimmer::{DimmerAddress, DimmerState};
use sunfade_domain::error::DeviceError;

pub use config::KasaConfig;
pub use error::KasaError;
use transport::Endpoint;

const SYSTEM: &str = "system";
const DIMMER: &str = "smartlife.iot.dimmer";

/// A power strip feeding some of the dimmers.
#[derive(Debug, Clone)]
pub struct PowerStrip {
    address: DimmerAddress,
    outlets: HashMap<DimmerAddress, u8>,
}

impl PowerStrip {
    #[must_use]
    pub fn new(address: DimmerAddress) -> Self {
        Self {
            address,
            outlets: HashMap::new(),
        }
    }

    /// Record that `dimmer` is plugged into the 1-based `outlet`.
    #[must_use]
    pub fn with_outlet(mut self, dimmer: DimmerAddress, outlet: u8) -> Self {
        self.outlets.insert(dimmer, outlet);
        self
    }
}

#[derive(Debug, Deserialize)]
struct SysInfo {
    relay_state: Option<u8>,
    brightness: Option<u8>,
    #[serde(default)]
    alias: String,
    #[serde(default)]
    children: Vec<Outlet>,
}

#[derive(Debug, Deserialize)]
struct Outlet {
    id: String,
    state: u8,
    #[serde(default)]
    alias: String,
}

/// [`DimmerClient`] speaking the Kasa protocol.
#[derive(Debug, Clone)]
pub struct KasaClient {
    config: KasaConfig,
    strip: Option<Arc<PowerStrip>>,
}

impl KasaClient {
    #[must_use]
    pub fn new(config: KasaConfig) -> Self {
        Self {
            config,
            strip: None,
        }
    }

    /// Enable outlet recovery through `strip`.
    #[must_use]
    pub fn with_strip(mut self, strip: PowerStrip) -> Self {
        self.strip = Some(Arc::new(strip));
        self
    }

    fn feeds(&self, dimmer: &DimmerAddress) -> bool {
        self.strip
            .as_ref()
            .is_some_and(|strip| strip.outlets.contains_key(dimmer))
    }

    /// Start outlet recovery for `dimmer` in the background.
    fn spawn_recovery(&self, dimmer: &DimmerAddress) {
        let client = self.clone();
        let dimmer = dimmer.clone();
        tokio::spawn(async move {
            match client.recover_outlet(&dimmer).await {
                Ok(true) => tracing::info!(address = %dimmer, "strip outlet switched on"),
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(address = %dimmer, %err, "strip outlet recovery failed");
                }
            }
        });
    }

    fn endpoint(&self, address: &DimmerAddress) -> Endpoint {
        Endpoint::parse(address.as_str(), self.config.port)
    }

    async fn send(&self, address: &DimmerAddress, request: &Value) -> Result<Value, KasaError> {
        transport::exchange(
            &self.endpoint(address),
            request,
            self.config.io_timeout(),
            self.config.max_frame_bytes,
        )
        .await
    }

    /// Send a command and check the `err_code` of `module.method`.
    async fn command(
        &self,
        address: &DimmerAddress,
        module: &'static str,
        method: &'static str,
        request: Value,
    ) -> Result<Value, KasaError> {
        let mut response = self.send(address, &request).await?;
        let body = response
            .get_mut(module)
            .and_then(|module| module.get_mut(method))
            .map(Value::take)
            .ok_or(KasaError::MissingField(method))?;
        match body.get("err_code").and_then(Value::as_i64) {
            Some(0) | None => Ok(body),
            Some(code) => Err(KasaError::Rejected { method, code }),
        }
    }

    async fn sysinfo(&self, address: &DimmerAddress) -> Result<SysInfo, KasaError> {
        let body = self
            .command(
                address,
                SYSTEM,
                "get_sysinfo",
                json!({ SYSTEM: { "get_sysinfo": {} } }),
            )
            .await?;
        serde_json::from_value(body).map_err(KasaError::Json)
    }

    async fn set_relay(&self, address: &DimmerAddress, on: bool) -> Result<(), KasaError> {
        self.command(
            address,
            SYSTEM,
            "set_relay_state",
            json!({ SYSTEM: { "set_relay_state": { "state": u8::from(on) } } }),
        )
        .await
        .map(|_| ())
    }

    /// Switch on the strip outlet feeding `dimmer` if it is off.
    ///
    /// Returns whether the outlet was switched on.
    async fn recover_outlet(&self, dimmer: &DimmerAddress) -> Result<bool, KasaError> {
        let Some(strip) = self.strip.as_ref() else {
            return Ok(false);
        };
        let Some(&outlet) = strip.outlets.get(dimmer) else {
            return Ok(false);
        };

        let info = self.sysinfo(&strip.address).await?;
        let child = usize::from(outlet)
            .checked_sub(1)
            .and_then(|index| info.children.get(index))
            .ok_or(KasaError::OutletOutOfRange(outlet))?;
        if child.state != 0 {
            return Ok(false);
        }

        tracing::warn!(
            dimmer = %dimmer,
            strip = %strip.address,
            outlet,
            outlet_alias = %child.alias,
            "dimmer unreachable and its outlet is off; switching outlet on"
        );
        self.command(
            &strip.address,
            SYSTEM,
            "set_relay_state",
            json!({
                "context": { "child_ids": [child.id] },
                SYSTEM: { "set_relay_state": { "state": 1 } },
            }),
        )
        .await?;
        Ok(true)
    }

    async fn read_state(&self, address: &DimmerAddress) -> Result<DimmerState, KasaError> {
        let info = self.sysinfo(address).await?;
        let relay = info.relay_state.ok_or(KasaError::MissingField("relay_state"))?;
        let level = info.brightness.ok_or(KasaError::MissingField("brightness"))?;
        let brightness = Brightness::new(level).map_err(KasaError::Domain)?;
        tracing::debug!(%address, alias = %info.alias, relay, level, "dimmer refreshed");
        Ok(DimmerState {
            is_on: relay != 0,
            brightness,
        })
    }
}

impl DimmerClient for KasaClient {
    async fn refresh(&self, address: &DimmerAddress) -> Result<DimmerState, DeviceError> {
        match self.read_state(address).await {
            Ok(state) => Ok(state),
            Err(err) => {
                if err.is_unreachable() && self.feeds(address) {
                    self.spawn_recovery(address);
                }
                Err(err.into())
            }
        }
    }

    async fn power_on(&self, address: &DimmerAddress) -> Result<(), DeviceError> {
        Ok(self.set_relay(address, true).await?)
    }

    async fn power_off(&self, address: &DimmerAddress) -> Result<(), DeviceError> {
        Ok(self.set_relay(address, false).await?)
    }

    async fn set_brightness(
        &self,
        address: &DimmerAddress,
        level: Brightness,
    ) -> Result<(), DeviceError> {
        self.command(
            address,
            DIMMER,
            "set_brightness",
            json!({ DIMMER: { "set_brightness": { "brightness": level.percent() } } }),
        )
        .await?;
        Ok(())
    }
}
