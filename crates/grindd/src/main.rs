//! Grindmode Daemon - serves the shared focus-mode configuration over HTTP

use anyhow::{Context, Result};
use grindd::config::DaemonConfig;
use grindd::server;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("grindd v{} starting", env!("CARGO_PKG_VERSION"));

    let config = DaemonConfig::from_env().context("Invalid daemon configuration")?;
    if config.uses_default_secret() {
        warn!("SECRET is not set, using the development default; set it before exposing grindd");
    }

    server::run(config).await
}
