//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the sync loop and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod astronomy;
pub mod clock;
pub mod dimmer;
pub mod notifier;

pub use astronomy::Astronomy;
pub use clock::{Clock, SystemClock};
pub use dimmer::DimmerClient;
pub use notifier::Notifier;
