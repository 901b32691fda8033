//! Virtual dimmer: holds an on/off relay and a level in memory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use sunfade_domain::brightness::Brightness;
use sunfade_domain::dimmer::DimmerState;

/// A simulated dimmer. Starts off at 0 and reachable.
pub struct VirtualDimmer {
    state: Mutex<DimmerState>,
    reachable: AtomicBool,
}

impl Default for VirtualDimmer {
    fn default() -> Self {
        Self {
            state: Mutex::new(DimmerState {
                is_on: false,
                brightness: Brightness::OFF,
            }),
            reachable: AtomicBool::new(true),
        }
    }
}

impl VirtualDimmer {
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Relaxed)
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Relaxed);
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> DimmerState {
        *self.lock_state()
    }

    pub fn power(&self, is_on: bool) {
        self.lock_state().is_on = is_on;
    }

    pub fn set_brightness(&self, level: Brightness) {
        self.lock_state().brightness = level;
    }

    fn lock_state(&self) -> MutexGuard<'_, DimmerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
