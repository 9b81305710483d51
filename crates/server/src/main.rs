//! layover server entry point.
//!
//! Boots the offline cache gateway: load configuration, open the cache,
//! run the install and activate phases for the configured generation, then
//! intercept site requests until shutdown. Logging goes to stderr.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use layover_client::{FetchClient, FetchConfig};
use layover_core::{AppConfig, CacheDb, Manifest};

mod error;
mod gateway;
mod worker;

use worker::CacheWorker;
use worker::events::EventTracker;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let origin = config.site_origin()?;
    let generation = config.generation()?;
    let manifest = Manifest::load(&config.manifest_path)?;

    tracing::info!(
        origin = %origin,
        generation = %generation,
        entries = manifest.len(),
        "starting layover"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let upstream = FetchClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    })?;

    let worker = CacheWorker::new(db, Arc::new(upstream), generation, origin);
    let events = EventTracker::new();

    // Install primes the current generation; activation immediately evicts
    // every other one.
    let installer = worker.clone();
    let report = events.dispatch(async move { installer.install(&manifest).await }).await?;
    tracing::info!(stored = report.stored, skipped = report.skipped, "install phase done");

    let activator = worker.clone();
    let activation = events.dispatch(async move { activator.activate().await }).await?;
    tracing::info!(evicted = activation.evicted.len(), "activate phase done");

    let state = gateway::AppState { worker, events: events.clone() };
    let app = gateway::router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr.as_str()).await?;
    tracing::info!(addr = %config.listen_addr, "gateway listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    // Let in-flight events settle before exit.
    events.drain().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
