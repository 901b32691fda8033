//! # sunfade-domain
//!
//! Pure domain model for the sunfade lighting loop.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps
//! - Define **Brightness** (a level guaranteed to be in `0..=100`)
//! - Define the **schedule** (fade window, schedule window, day phase) and
//!   the pure time → brightness mapping
//! - Define **Dimmer handles** (address, last-known state, connectivity)
//! - Define **Coordinates** of the installation
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod brightness;
pub mod dimmer;
pub mod geo;
pub mod schedule;
