// src/server/mod.rs
use std::sync::Arc;

use rocket::{routes, Build, Rocket};

use crate::aggregator::CampaignAggregator;
use crate::api::*;
use crate::config::Config;
use crate::database::PillarStore;
use crate::ingestion::IngestionOrchestrator;
use crate::provider::CampaignSource;
use crate::scheduler::IngestionScheduler;

pub mod routes;

pub struct ServerState {
    pub config: Config,
    pub provider: Arc<dyn CampaignSource>,
    pub aggregator: Arc<CampaignAggregator>,
    pub orchestrator: Arc<IngestionOrchestrator>,
    pub scheduler: Arc<IngestionScheduler>,
    pub store: Arc<dyn PillarStore>,
}

pub fn build_rocket(state: ServerState) -> Rocket<Build> {
    rocket::build().manage(state).mount(
        "/api",
        routes![
            // Health and info endpoints
            routes::health::health_check,
            routes::health::index,
            // Campaign analytics endpoints
            get_campaigns,
            get_all_campaigns,
            get_campaign_report,
            get_campaign_links,
            get_subscriber_lists,
            // Ingestion endpoints
            trigger_ingestion,
            get_ingestion_status,
        ],
    )
}
