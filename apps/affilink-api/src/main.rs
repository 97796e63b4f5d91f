//! AffiLink API - Marketplace HTTP host
//!
//! Serves the campaign lifecycle, attribution and settlement operations of
//! the marketplace core over JSON, backed by PostgreSQL.

mod config;
mod dto;
mod error;
mod handlers;
mod routes;
mod sinks;

use affilink_domain::{Marketplace, ServiceContext};
use affilink_postgres::{PgDirectory, PgStore};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::sinks::{LogAuditSink, LogNotifier};

pub type AppMarketplace = Marketplace<PgStore, PgDirectory>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub marketplace: Arc<AppMarketplace>,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_json);

    info!("Starting AffiLink API");

    let store = PgStore::connect(&config.database_url, config.db_max_connections).await?;
    store.migrate().await?;
    let directory = PgDirectory::new(store.pool().clone());

    let ctx = ServiceContext::new(
        Arc::new(LogAuditSink),
        Arc::new(LogNotifier),
        config.marketplace.clone(),
    );

    info!(
        minimum_withdrawal = %config.marketplace.minimum_withdrawal,
        token_length = config.marketplace.tracking_token_length,
        "Marketplace services configured"
    );

    let state = AppState {
        marketplace: Arc::new(Marketplace::new(store, directory, ctx)),
    };

    // Build HTTP router
    let app = routes::create_router(state);

    let addr = config.bind_addr();
    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
