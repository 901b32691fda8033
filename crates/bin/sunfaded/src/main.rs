//! # sunfaded: sunfade daemon
//!
//! Composition root that wires the adapters together and runs the device
//! sync loop until SIGINT or SIGTERM.
//!
//! ## Responsibilities
//! - Load and validate configuration (file, then environment)
//! - Initialise logging
//! - Construct the dimmer backend, the solar calculator and the notifier
//! - Run the sync loop and stop it through a watch channel on shutdown
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer, and no domain logic belongs here.

mod backend;
mod config;

use anyhow::Context;
use sunfade_adapter_kasa::KasaClient;
use sunfade_adapter_sms::SmsNotifier;
use sunfade_adapter_solar::SolarCalculator;
use sunfade_adapter_virtual::VirtualDimmers;
use sunfade_app::ports::SystemClock;
use sunfade_app::services::notification_gate::NotificationGate;
use sunfade_app::sync_loop::DeviceSyncLoop;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::backend::Backend;
use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging.filter);

    let addresses = config.addresses()?;
    let backend = match config.devices.backend {
        config::BackendKind::Kasa => {
            let mut client = KasaClient::new(config.devices.kasa.clone());
            if let Some(strip) = config.power_strip()? {
                client = client.with_strip(strip);
            }
            Backend::Kasa(client)
        }
        config::BackendKind::Virtual => {
            tracing::warn!("using virtual dimmers; no real device will be touched");
            Backend::Virtual(VirtualDimmers::new(addresses.iter().cloned()))
        }
    };

    let astronomy =
        SolarCalculator::new(config.coordinates()?, config.location.timezone.as_deref())?;

    let gate = if config.notifications.enabled {
        let notifier =
            SmsNotifier::new(&config.notifications.sms).context("failed to set up SMS alerts")?;
        NotificationGate::new(notifier, config.cooldown())
    } else {
        tracing::info!("notifications disabled");
        NotificationGate::disabled()
    };

    let mut sync = DeviceSyncLoop::new(
        backend,
        astronomy,
        SystemClock,
        gate,
        config.sync_settings()?,
        addresses,
    )?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    sync.run(shutdown_rx).await;
    tracing::info!("sunfaded stopped");
    Ok(())
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?} ({err}), falling back to info");
        EnvFilter::new("info")
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
