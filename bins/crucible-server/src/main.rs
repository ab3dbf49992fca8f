mod executor;
mod handlers;
mod languages;
mod parsers;
mod process;
mod routes;
mod session;
mod workspace;

use anyhow::Context;
use crucible_common::config::Config;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub struct AppState {
    pub redis: ConnectionManager,
    pub config: Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Crucible server booting...");

    let config = Config::from_env().context("invalid configuration")?;
    let port = config.port;

    let client = redis::Client::open(config.redis_url().as_str())
        .context("failed to create Redis client")?;
    let redis_conn = ConnectionManager::new(client)
        .await
        .context("failed to connect to session store")?;
    info!("Connected to session store: {}", config.redis_url());

    let enabled: Vec<String> = config
        .registry
        .enabled_languages()
        .iter()
        .map(|l| l.to_string())
        .collect();
    info!("Enabled languages: {}", enabled.join(", "));

    let state = Arc::new(AppState {
        redis: redis_conn,
        config,
    });

    let app = routes::routes(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .context("failed to bind listen address")?;
    info!("HTTP server listening on {}", addr);
    info!("Ready to accept submissions");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
