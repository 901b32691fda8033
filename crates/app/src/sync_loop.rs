//! Device sync loop: keeps every configured dimmer at the scheduled level.
//!
//! Each cycle:
//!
//! 1. reads the clock and today's sun times, and derives the target level;
//! 2. for every dimmer, refreshes its live state, then powers it off (target
//!    0) or on at the target level, skipping devices that already match;
//! 3. logs per-device failures without touching the other devices;
//! 4. once every dimmer has been handled, sends one rate-limited alert
//!    covering all failures of the cycle, bounded by the device timeout;
//! 5. sleeps for the poll interval.
//!
//! Nothing is retried inside a cycle. The next cycle's refresh is the retry.
//! Both the cycle and the sleep race the shutdown signal, so cancellation is
//! prompt.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

use sunfade_domain::brightness::Brightness;
use sunfade_domain::dimmer::{DimmerAddress, DimmerHandle};
use sunfade_domain::error::{DeviceError, SunfadeError, ValidationError};
use sunfade_domain::schedule::{DayPhase, FadeWindow, Target};
use sunfade_domain::time::Timestamp;

use crate::ports::{Astronomy, Clock, DimmerClient, Notifier};
use crate::services::notification_gate::NotificationGate;

/// Tunables of the sync loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Sleep between two cycles.
    pub poll_interval: Duration,
    /// Ramp length on either side of the day.
    pub fade: FadeWindow,
    /// Upper bound for any single device operation, and for delivering the
    /// alert of a cycle.
    pub device_timeout: Duration,
    /// Re-send commands even when a device already shows the target.
    pub reapply_unchanged: bool,
}

/// What one cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub at: Timestamp,
    pub phase: DayPhase,
    pub target: Brightness,
    /// Devices that received commands.
    pub applied: Vec<DimmerAddress>,
    /// Devices that already showed the target.
    pub unchanged: Vec<DimmerAddress>,
    /// Devices whose refresh or commands failed.
    pub failed: Vec<DimmerAddress>,
}

enum DimmerOutcome {
    Applied,
    Unchanged,
}

/// The polling loop and everything it owns.
pub struct DeviceSyncLoop<D, A, N, C> {
    client: D,
    astronomy: A,
    clock: C,
    gate: NotificationGate<N>,
    settings: SyncSettings,
    dimmers: Vec<DimmerHandle>,
    last_phase: Option<DayPhase>,
}

impl<D, A, N, C> DeviceSyncLoop<D, A, N, C>
where
    D: DimmerClient,
    A: Astronomy,
    N: Notifier,
    C: Clock,
{
    /// Build a loop over a fixed list of dimmer addresses.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoDimmers`] for an empty list,
    /// [`ValidationError::DuplicateAddress`] if an address repeats, and
    /// [`ValidationError::ZeroPollInterval`] for a zero poll interval.
    pub fn new(
        client: D,
        astronomy: A,
        clock: C,
        gate: NotificationGate<N>,
        settings: SyncSettings,
        addresses: Vec<DimmerAddress>,
    ) -> Result<Self, ValidationError> {
        if addresses.is_empty() {
            return Err(ValidationError::NoDimmers);
        }
        if settings.poll_interval.is_zero() {
            return Err(ValidationError::ZeroPollInterval);
        }
        let mut dimmers: Vec<DimmerHandle> = Vec::with_capacity(addresses.len());
        for address in addresses {
            if dimmers.iter().any(|d| d.address() == &address) {
                return Err(ValidationError::DuplicateAddress(address.to_string()));
            }
            dimmers.push(DimmerHandle::new(address));
        }
        Ok(Self {
            client,
            astronomy,
            clock,
            gate,
            settings,
            dimmers,
            last_phase: None,
        })
    }

    /// Current view of every dimmer.
    #[must_use]
    pub fn dimmers(&self) -> &[DimmerHandle] {
        &self.dimmers
    }

    #[must_use]
    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Run cycles until `shutdown` turns `true` or its sender is dropped.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            dimmers = self.dimmers.len(),
            poll_interval = ?self.settings.poll_interval,
            fade_mins = self.settings.fade.duration().num_minutes(),
            "device sync loop started"
        );

        loop {
            let cycle = tokio::select! {
                biased;
                () = cancelled(&mut shutdown) => Err(SunfadeError::Cancelled),
                report = self.run_cycle() => Ok(report),
            };
            if let Err(err) = cycle {
                tracing::info!(%err, "device sync loop stopped during a cycle");
                return;
            }

            let interval = self.settings.poll_interval;
            let slept = tokio::select! {
                biased;
                () = cancelled(&mut shutdown) => Err(SunfadeError::Cancelled),
                () = tokio::time::sleep(interval) => Ok(()),
            };
            if let Err(err) = slept {
                tracing::info!(%err, "device sync loop stopped");
                return;
            }
        }
    }

    /// Run a single refresh → compute → apply pass over every dimmer.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn run_cycle(&mut self) -> CycleReport {
        let now = self.clock.now();
        let Target { phase, brightness } = self
            .astronomy
            .sun_times(now)
            .target_at(now, self.settings.fade);

        if self.last_phase != Some(phase) {
            tracing::info!(%phase, target = %brightness, "entering day phase");
            self.last_phase = Some(phase);
        }

        let mut report = CycleReport {
            at: now,
            phase,
            target: brightness,
            applied: Vec::new(),
            unchanged: Vec::new(),
            failed: Vec::new(),
        };
        let mut failures = Vec::new();

        for handle in &mut self.dimmers {
            let result = sync_dimmer(
                &self.client,
                handle,
                brightness,
                now,
                self.settings.device_timeout,
                self.settings.reapply_unchanged,
            )
            .await;

            match result {
                Ok(DimmerOutcome::Applied) => {
                    tracing::debug!(address = %handle.address(), target = %brightness, "dimmer updated");
                    report.applied.push(handle.address().clone());
                }
                Ok(DimmerOutcome::Unchanged) => {
                    report.unchanged.push(handle.address().clone());
                }
                Err(err) => {
                    if err.is_unreachable() {
                        handle.mark_unreachable();
                    }
                    let err = err.at(handle.address().clone());
                    let detail = describe(&err);
                    tracing::warn!(error = %detail, "dimmer sync failed, retrying next cycle");
                    failures.push(detail);
                    report.failed.push(handle.address().clone());
                }
            }
        }

        if !failures.is_empty() {
            self.alert(now, &failures).await;
        }

        tracing::debug!(
            %phase,
            target = %brightness,
            applied = report.applied.len(),
            unchanged = report.unchanged.len(),
            failed = report.failed.len(),
            "cycle complete"
        );
        report
    }

    /// Hand the failures of a cycle to the gate as a single message.
    async fn alert(&mut self, now: Timestamp, failures: &[String]) {
        let message = format!("sunfade: {}", failures.join("; "));
        let limit = self.settings.device_timeout;
        if tokio::time::timeout(limit, self.gate.alert(now, &message))
            .await
            .is_err()
        {
            tracing::warn!(timeout = ?limit, "alert delivery timed out");
        }
    }
}

/// Refresh one dimmer and bring it to `target`.
async fn sync_dimmer<D: DimmerClient>(
    client: &D,
    handle: &mut DimmerHandle,
    target: Brightness,
    now: Timestamp,
    timeout: Duration,
    reapply_unchanged: bool,
) -> Result<DimmerOutcome, DeviceError> {
    let address = handle.address().clone();

    let state = bounded(timeout, client.refresh(&address)).await?;
    handle.record_refresh(state, now);

    if !reapply_unchanged && state.matches(target) {
        return Ok(DimmerOutcome::Unchanged);
    }

    if target.is_off() {
        bounded(timeout, client.power_off(&address)).await?;
    } else {
        bounded(timeout, client.power_on(&address)).await?;
        bounded(timeout, client.set_brightness(&address, target)).await?;
    }
    handle.record_applied(target);
    Ok(DimmerOutcome::Applied)
}

/// Run a device operation with an upper time bound. Running out of time
/// counts as the device being unreachable.
async fn bounded<T>(
    limit: Duration,
    operation: impl Future<Output = Result<T, DeviceError>>,
) -> Result<T, DeviceError> {
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|elapsed| DeviceError::Unreachable(Box::new(elapsed)))?
}

/// Resolves once shutdown has been requested or can no longer be requested.
async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Render an error with its whole source chain on one line.
fn describe(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
