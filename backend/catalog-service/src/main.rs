//! Catalog Service Main Entry Point
//!
//! Starts the gRPC server with:
//! - In-memory device, rating and user stores
//! - Disk-backed image store
//! - Role-based JWT auth layer

use anyhow::{Context, Result};
use catalog_service::{config::Settings, App};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "catalog_service=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting Catalog Service");

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    let app = App::from_settings(&settings).context("Failed to initialize stores")?;
    info!(
        image_folder = %settings.images.folder.display(),
        demo_users = settings.seed_demo_users,
        "Stores initialized"
    );

    let addr = settings
        .server
        .address()
        .parse()
        .context("Invalid server address")?;

    info!("Starting gRPC server on {}", addr);

    app.router()
        .serve_with_shutdown(addr, shutdown_signal())
        .await
        .context("gRPC server error")?;

    info!("Catalog service shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutting down gracefully...");
}
