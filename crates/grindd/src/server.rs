//! HTTP server for grindd

use crate::config::DaemonConfig;
use crate::routes;
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use grind_common::ModeStateMachine;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Maximum body size: 64 KiB
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Application state shared across handlers
pub struct AppState {
    pub machine: Arc<ModeStateMachine>,
    /// Admin bearer secret
    pub secret: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(machine: ModeStateMachine, secret: impl Into<String>) -> Self {
        Self {
            machine: Arc::new(machine),
            secret: secret.into(),
            start_time: Instant::now(),
        }
    }

    pub fn from_config(config: &DaemonConfig) -> Self {
        let machine = ModeStateMachine::open(&config.state_file, config.seed_whitelist.clone());
        Self::new(machine, config.secret.clone())
    }
}

/// Build the router. Every origin is allowed: the admin panel and the
/// browser extension are served from elsewhere.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::config_routes())
        .merge(routes::client_routes())
        .merge(routes::health_routes())
        .fallback(routes::not_found)
        .with_state(Arc::new(state))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until Ctrl-C
pub async fn run(config: DaemonConfig) -> Result<()> {
    let app = router(AppState::from_config(&config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("  State file: {}", config.state_file.display());
    info!("  Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await;
}

/// Resolve once `signal` fires. If the handler cannot be installed, keep
/// serving and never resolve.
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Shutting down gracefully"),
        Err(e) => {
            error!("Failed to listen for Ctrl-C, graceful shutdown disabled: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
