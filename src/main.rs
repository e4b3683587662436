use std::{net::TcpListener, sync::Arc};

use anyhow::Context;
use foodgram::{build_app, run_app, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(Config::from_env()?);
    let app = build_app(Arc::clone(&config)).await?;
    let listener = TcpListener::bind(config.listen_addr)
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    run_app(app, listener)
        .await
        .inspect_err(|e| tracing::error!("server stopped: {e:#}"))
}
