//! Kasa adapter configuration.

use std::time::Duration;

use serde::Deserialize;

/// Port the Kasa local protocol listens on.
pub const DEFAULT_PORT: u16 = 9999;

/// Configuration for talking to Kasa devices.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KasaConfig {
    /// Port used when a device address does not name one.
    pub port: u16,
    /// Limit for a single request/response exchange, in milliseconds.
    pub io_timeout_ms: u64,
    /// Largest response frame accepted from a device, in bytes.
    pub max_frame_bytes: u32,
}

impl KasaConfig {
    #[must_use]
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

impl Default for KasaConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            io_timeout_ms: 3_000,
            max_frame_bytes: 64 * 1024,
        }
    }
}
