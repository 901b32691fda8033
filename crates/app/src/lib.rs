//! # sunfade-app
//!
//! Application layer: the device sync loop and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DimmerClient`: refresh, power on/off, set brightness
//!   - `Astronomy`: today's sunrise and sunset
//!   - `Notifier`: deliver a user-facing alert
//!   - `Clock`: the current time
//! - Provide the **notification gate** (cooldown-based rate limiting)
//! - Run the **device sync loop**: refresh → compute → apply → sleep, with
//!   per-device failure isolation and cancellable sleeps
//!
//! ## Dependency rule
//! Depends on `sunfade-domain` only (plus `tokio` for timers and the shutdown
//! channel). Never imports adapter crates. Adapters depend on *this* crate,
//! not the reverse.

pub mod ports;
pub mod services;
pub mod sync_loop;
