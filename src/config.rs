use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub provider: ProviderConfig,
    pub filter: FilterSettings,
    pub ingestion: IngestionConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Page size used when walking the provider's campaign list.
    pub page_size: usize,
    pub request_timeout_seconds: u64,
}

/// Raw filter settings as written in config.yml; parsed into a
/// `filter::FilterConfig` at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterSettings {
    /// Comma-separated campaign IDs, e.g. "330,329". Empty means
    /// no ID restriction.
    pub campaign_ids: String,
    /// Optional case-insensitive name substring, e.g. "Weekly Newsletter".
    pub name_pattern: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestionConfig {
    pub job_name: String,
    /// Items requested from the refresh collaborator per pillar.
    pub items_per_pillar: usize,
    /// Delay between pillar refreshes, the rate-limit ceiling against
    /// the refresh provider.
    pub pillar_delay_seconds: u64,
    /// Endpoint the production refresh client posts to.
    pub refresh_api_url: String,
    /// Optional external workflow webhook. When set, scheduled runs are
    /// delegated there first and fall back to the local path on failure.
    pub workflow_webhook_url: String,
    pub webhook_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Daily fire time, UTC wall clock.
    pub fire_hour: u32,
    pub fire_minute: u32,
    /// How late a missed fire may still run before the day is skipped.
    pub misfire_grace_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                page_size: 500,
                request_timeout_seconds: 30,
            },
            filter: FilterSettings {
                campaign_ids: String::new(),
                name_pattern: String::new(),
            },
            ingestion: IngestionConfig {
                job_name: "daily-news-update".to_string(),
                items_per_pillar: 6,
                pillar_delay_seconds: 2,
                refresh_api_url: String::new(),
                workflow_webhook_url: String::new(),
                webhook_timeout_seconds: 60,
            },
            scheduler: SchedulerConfig {
                enabled: true,
                fire_hour: 0,
                fire_minute: 0,
                misfire_grace_seconds: 3600,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

pub async fn load_config(
    path: &str,
) -> std::result::Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&content)?;
    Ok(config)
}
