// src/main.rs
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod aggregator;
mod api;
mod config;
mod database;
mod error;
mod filter;
mod ingestion;
mod metrics;
mod models;
mod provider;
mod refresh;
mod scheduler;
mod server;

use aggregator::CampaignAggregator;
use config::{load_config, Config};
use database::{create_db_pool, SqlitePillarStore};
use filter::FilterConfig;
use ingestion::IngestionOrchestrator;
use models::Result;
use provider::{ProviderClient, ProviderCredentials};
use refresh::HttpRefreshClient;
use scheduler::IngestionScheduler;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let config = match load_config("config.yml").await {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config.yml: {}. Using defaults.", e);
            Config::default()
        }
    };

    // Setup logging
    let directive = format!("campaign_digest={}", config.logging.level);
    std::env::set_var(
        "RUST_LOG",
        format!("{},hyper=warn,rocket=warn", directive),
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(directive.parse().unwrap_or_default()),
        )
        .init();

    // Initialize database
    info!("Initializing database...");
    let db_pool = create_db_pool("data/digest.db").await?;
    let store = Arc::new(SqlitePillarStore::new(db_pool));

    // Campaign provider
    let provider = Arc::new(ProviderClient::new(
        ProviderCredentials::from_env(),
        config.provider.request_timeout_seconds,
    ));
    if !provider.is_configured() {
        warn!("Campaign provider credentials not set; analytics endpoints will return 503");
    }
    let filter = FilterConfig::from_parts(
        &config.filter.campaign_ids,
        &config.filter.name_pattern,
    );
    let aggregator = Arc::new(CampaignAggregator::new(
        provider.clone(),
        filter,
        config.provider.page_size,
    ));

    // Ingestion pipeline
    let refresh = Arc::new(HttpRefreshClient::new(
        config.ingestion.refresh_api_url.clone(),
        config.provider.request_timeout_seconds,
    ));
    let orchestrator = Arc::new(IngestionOrchestrator::new(
        store.clone(),
        refresh,
        config.ingestion.clone(),
    ));
    let scheduler = Arc::new(IngestionScheduler::new(
        orchestrator.clone(),
        config.scheduler.clone(),
        config.ingestion.job_name.clone(),
    ));

    if config.scheduler.enabled {
        scheduler.start().await;
    } else {
        info!("Scheduler disabled by configuration");
    }

    let state = server::ServerState {
        config,
        provider,
        aggregator,
        orchestrator,
        scheduler: scheduler.clone(),
        store,
    };

    let rocket = server::build_rocket(state);

    tokio::select! {
        result = rocket.launch() => {
            result?;
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            scheduler.stop().await;
        }
    }

    Ok(())
}
