//! Dimmer: a network-controllable light with on/off and a 0–100 level.
//!
//! A [`DimmerHandle`] is the sync loop's view of one configured device: its
//! address plus whatever was last learned about it. Handles live for the
//! whole process and are only touched by the loop that owns them.

use serde::{Deserialize, Serialize};

use crate::brightness::Brightness;
use crate::error::ValidationError;
use crate::time::Timestamp;

/// Network address of a dimmer (`host` or `host:port`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DimmerAddress(String);

impl DimmerAddress {
    /// Build an address, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyAddress`] if nothing is left after
    /// trimming.
    pub fn new(address: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = address.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyAddress);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The address as written in the configuration.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DimmerAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DimmerAddress> for String {
    fn from(value: DimmerAddress) -> Self {
        value.0
    }
}

impl std::fmt::Display for DimmerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// On/off state of the dimmer's relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
    #[default]
    Unknown,
}

impl PowerState {
    #[must_use]
    pub fn from_on(is_on: bool) -> Self {
        if is_on { Self::On } else { Self::Off }
    }
}

/// Whether the last attempt to talk to the dimmer succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Reachable,
    Unreachable,
    /// Not refreshed yet.
    #[default]
    Unknown,
}

/// Live state reported by a dimmer on refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimmerState {
    pub is_on: bool,
    pub brightness: Brightness,
}

impl DimmerState {
    /// Whether the device already shows `target`: off for 0, otherwise on at
    /// exactly that level.
    #[must_use]
    pub fn matches(&self, target: Brightness) -> bool {
        if target.is_off() {
            !self.is_on
        } else {
            self.is_on && self.brightness == target
        }
    }
}

/// The sync loop's record of one configured dimmer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimmerHandle {
    address: DimmerAddress,
    power: PowerState,
    brightness: Option<Brightness>,
    connectivity: Connectivity,
    last_seen: Option<Timestamp>,
}

impl DimmerHandle {
    /// A handle for a device nothing is known about yet.
    #[must_use]
    pub fn new(address: DimmerAddress) -> Self {
        Self {
            address,
            power: PowerState::Unknown,
            brightness: None,
            connectivity: Connectivity::Unknown,
            last_seen: None,
        }
    }

    #[must_use]
    pub fn address(&self) -> &DimmerAddress {
        &self.address
    }

    #[must_use]
    pub fn power(&self) -> PowerState {
        self.power
    }

    #[must_use]
    pub fn brightness(&self) -> Option<Brightness> {
        self.brightness
    }

    #[must_use]
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Time of the last successful refresh.
    #[must_use]
    pub fn last_seen(&self) -> Option<Timestamp> {
        self.last_seen
    }

    /// The last refreshed state, if the device is currently reachable.
    #[must_use]
    pub fn known_state(&self) -> Option<DimmerState> {
        if self.connectivity != Connectivity::Reachable {
            return None;
        }
        let is_on = match self.power {
            PowerState::On => true,
            PowerState::Off => false,
            PowerState::Unknown => return None,
        };
        self.brightness.map(|brightness| DimmerState { is_on, brightness })
    }

    /// Record a successful refresh.
    pub fn record_refresh(&mut self, state: DimmerState, at: Timestamp) {
        self.power = PowerState::from_on(state.is_on);
        self.brightness = Some(state.brightness);
        self.connectivity = Connectivity::Reachable;
        self.last_seen = Some(at);
    }

    /// Record a failed refresh or command. Cached state is kept but no longer
    /// trusted.
    pub fn mark_unreachable(&mut self) {
        self.connectivity = Connectivity::Unreachable;
    }

    /// Record that `target` was applied successfully.
    pub fn record_applied(&mut self, target: Brightness) {
        if target.is_off() {
            self.power = PowerState::Off;
        } else {
            self.power = PowerState::On;
            self.brightness = Some(target);
        }
    }
}
