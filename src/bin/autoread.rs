//! autoread server binary
//!
//! Loads `.env`, reads configuration (`AUTOREAD_CONFIG` plus environment
//! overrides) and serves the REST API until SIGINT/SIGTERM.

use autoread::{Config, run_with_shutdown};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "autoread=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Config::load()?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        storage = %config.storage.root.display(),
        bind = %config.server.api.bind_address,
        "starting autoread"
    );

    run_with_shutdown(config).await?;
    tracing::info!("autoread stopped");
    Ok(())
}
