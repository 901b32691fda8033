//! Application services used by the sync loop.

pub mod notification_gate;
