//! Client for the content refresh endpoint that produces fresh news
//! items for a category.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error};

use crate::models::{NewsItem, Result};

/// Seam between ingestion and the content generator, so runs can be
/// driven by a stub in tests.
#[async_trait]
pub trait RefreshPort: Send + Sync {
    async fn refresh_content(&self, category: &str, desired_count: usize)
        -> Result<Vec<NewsItem>>;
}

pub struct HttpRefreshClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRefreshClient {
    pub fn new(endpoint: String, timeout_seconds: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, endpoint }
    }
}

#[async_trait]
impl RefreshPort for HttpRefreshClient {
    async fn refresh_content(
        &self,
        category: &str,
        desired_count: usize,
    ) -> Result<Vec<NewsItem>> {
        if self.endpoint.trim().is_empty() {
            return Err("refresh endpoint is not configured".into());
        }

        debug!("🔄 Requesting {} items for category '{}'", desired_count, category);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({
                "category": category,
                "num_items": desired_count,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Refresh for '{}' failed (HTTP {}): {}", category, status, body);
            return Err(format!("refresh request failed with HTTP {}", status).into());
        }

        let items: Vec<NewsItem> = response.json().await?;
        debug!("✅ Received {} items for '{}'", items.len(), category);
        Ok(items)
    }
}
