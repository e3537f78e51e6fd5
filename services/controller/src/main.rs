//! brood controller
//!
//! Keeps every Bird's eggs at the count its spec declares. Serves the HTTP
//! API, runs the reconciliation workers and garbage-collects the eggs of
//! deleted birds.

use std::sync::Arc;

use anyhow::Result;
use brood_api::{Bird, Egg};
use brood_controller::{
    api,
    config,
    controller::{Controller, ControllerConfig},
    owner_index::OwnerIndexConfig,
    state::AppState,
};
use brood_store::{GarbageCollector, MemoryStore, ResourceStore};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::Config::from_env()?;

    // Initialize tracing (prefer RUST_LOG, fallback to BROOD_LOG_LEVEL)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting brood controller");
    info!(listen_addr = %config.listen_addr, workers = config.workers, "Configuration loaded");

    let birds: Arc<dyn ResourceStore<Bird>> = Arc::new(MemoryStore::<Bird>::new());
    let eggs: Arc<dyn ResourceStore<Egg>> = Arc::new(MemoryStore::<Egg>::new());
    let owner_index = OwnerIndexConfig::default();

    // Create shutdown channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Start the controller in background
    let controller = Controller::new(
        birds.clone(),
        eggs.clone(),
        owner_index.clone(),
        ControllerConfig::from(&config),
    );
    let controller_handle = tokio::spawn({
        let shutdown_rx = shutdown_rx.clone();
        async move {
            if let Err(e) = controller.run(shutdown_rx).await {
                error!(error = %e, "Controller failed");
            }
        }
    });

    // Start the garbage collector in background
    let gc = GarbageCollector::new(birds.clone(), eggs.clone());
    let gc_handle = tokio::spawn({
        let shutdown_rx = shutdown_rx.clone();
        async move {
            gc.run(shutdown_rx).await;
        }
    });

    // Build and run the server
    let app = api::create_router(AppState::new(birds, eggs, owner_index));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    // Spawn the server with graceful shutdown
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let mut shutdown_rx = shutdown_rx;
                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
    });

    // Wait for shutdown signal (Ctrl+C)
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = server_handle => {
            match result {
                Ok(Ok(())) => info!("Server exited normally"),
                Ok(Err(e)) => error!(error = %e, "Server error"),
                Err(e) => error!(error = %e, "Server task panicked"),
            }
        }
    }

    // Signal shutdown to all workers
    let _ = shutdown_tx.send(true);

    info!("Waiting for workers to shut down...");
    let shutdown_timeout = std::time::Duration::from_secs(10);

    if let Err(e) = tokio::time::timeout(shutdown_timeout, controller_handle).await {
        warn!(error = %e, "Controller did not shut down in time");
    }

    if let Err(e) = tokio::time::timeout(shutdown_timeout, gc_handle).await {
        warn!(error = %e, "Garbage collector did not shut down in time");
    }

    info!("brood controller shutdown complete");
    Ok(())
}
