//! portico gateway entry point.
//!
//! Boot order matters: the precache must be fully committed and stale cache
//! generations cleaned up before the listener binds, so the first request
//! the gateway accepts already sees a warm, current-version cache.
//! Logging goes to stderr as JSON lines.

use anyhow::{Context, Result};
use portico_client::{HttpOrigin, OriginConfig};
use portico_core::{AppConfig, CacheDb};
use portico_server::{Gateway, Lifecycle};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    tracing::info!(
        upstream = %config.upstream_origin,
        version = %config.cache_version,
        db = %config.db_path.display(),
        "Starting portico gateway"
    );

    let db = CacheDb::open(&config.db_path)
        .await
        .context("failed to open cache database")?;

    let origin = Arc::new(
        HttpOrigin::new(OriginConfig {
            base_url: config.upstream_origin.clone(),
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        })
        .context("failed to build origin client")?,
    );

    let mut lifecycle = Lifecycle::new(
        db.clone(),
        origin.clone(),
        config.cache_version.clone(),
        config.precache_assets.clone(),
    );
    lifecycle.install().await.context("install failed")?;
    lifecycle.activate().await.context("activate failed")?;

    let gateway = Gateway::new(&config, db, origin);
    let app = gateway.router();

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
