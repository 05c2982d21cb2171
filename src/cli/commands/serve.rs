use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, StoreBackend};
use crate::database::{DatabaseManager, MemoryStore, PgStore, Store};
use crate::services::{OpenAiClient, ReplyGenerator, StripeClient};
use crate::state::AppState;

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(port) = port {
        config.server.port = port;
    }

    init_tracing(&config);
    info!("Starting North Pole Pen Pals API in {:?} mode", config.environment);

    let store: Arc<dyn Store> = match config.database.backend {
        StoreBackend::Postgres => Arc::new(PgStore::new(DatabaseManager::connect(&config.database)?)),
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::with_sample_elves().await)
        }
    };

    let timeout = Duration::from_secs(config.api.outbound_timeout_secs);
    let completions = OpenAiClient::new(config.replies.clone(), timeout)?;
    let payments = StripeClient::new(&config.billing, timeout)?;

    let port = config.server.port;
    let state = AppState::new(config, store, ReplyGenerator::new(Arc::new(completions)), Arc::new(payments));
    if let Some(limits) = state.rate_limit.clone() {
        // Drop idle client entries so the limiter table stays bounded
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                limits.limiter().retain_recent();
            }
        });
    }
    let app = crate::app(state);

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!("🎄 North Pole Pen Pals listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    // try_init: a subscriber may already be installed when embedded
    let _ = if config.is_production() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
