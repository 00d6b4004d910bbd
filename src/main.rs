//! WiFi Provisioning Service - Main Entry Point

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wifi_provisioning_service::{
    Cipher, NetworkBackend, NetworkManagerBackend, ProvisioningPeripheral,
    config::{CliArgs, Settings},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let settings = Settings::try_from(args)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        name = %settings.local_name,
        path = %settings.root_path,
        "starting wifi provisioning service"
    );

    let connection = zbus::Connection::system().await?;
    let backend = Arc::new(NetworkManagerBackend::new(connection.clone()));

    if !backend.is_networking_enabled().await? {
        info!("enabling networking");
        backend.set_networking_enabled(true).await?;
    }
    if !backend.is_wireless_enabled().await? {
        info!("enabling wireless radio");
        backend.set_wireless_enabled(true).await?;
    }

    let peripheral = ProvisioningPeripheral::new(
        connection,
        backend,
        Cipher::new(settings.key),
        settings.root_path,
        settings.local_name,
    );
    if !peripheral.is_powered().await? {
        info!("powering bluetooth adapter on");
        peripheral.set_powered(true).await?;
    }

    peripheral.install().await?;
    info!("peripheral installed, advertising");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully");
        }
        _ = shutdown_signal() => {
            info!("Received SIGTERM, shutting down gracefully");
        }
    }

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");

    sigterm.recv().await;
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    // On non-Unix platforms, just wait forever
    std::future::pending::<()>().await
}
