//! HTTP client for the external campaign provider.
//!
//! Owns the mapping from the provider's wire field names to the
//! canonical shapes in `models`, and the translation of transport/HTTP
//! failures into `ProviderError` variants at the point the response is
//! inspected.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use crate::error::ProviderError;
use crate::metrics::rate;
use crate::models::{Campaign, CampaignStatus, Link, SubscriberList};

const BODY_EXCERPT_LEN: usize = 500;

/// Read-side provider operations, behind a trait so the aggregator can
/// be exercised against an in-memory source in tests.
#[async_trait]
pub trait CampaignSource: Send + Sync {
    /// One page of campaigns; the caller drives pagination.
    async fn list_campaigns(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Campaign>, ProviderError>;

    async fn get_campaign(&self, id: &str) -> Result<Campaign, ProviderError>;

    /// Links for one campaign, sorted by clicks descending (stable).
    async fn get_campaign_links(&self, id: &str) -> Result<Vec<Link>, ProviderError>;

    async fn list_subscriber_lists(&self) -> Result<Vec<SubscriberList>, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub base_url: String,
    pub api_key: String,
}

impl ProviderCredentials {
    /// Read credentials from the environment. Blank values count as
    /// unconfigured; a trailing slash on the URL is trimmed.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("CAMPAIGN_PROVIDER_URL").unwrap_or_default();
        let api_key = std::env::var("CAMPAIGN_PROVIDER_API_KEY").unwrap_or_default();
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let api_key = api_key.trim().to_string();
        if base_url.is_empty() || api_key.is_empty() {
            return None;
        }
        if Url::parse(&base_url).is_err() {
            error!("CAMPAIGN_PROVIDER_URL is not a valid URL: {}", base_url);
            return None;
        }
        Some(Self { base_url, api_key })
    }
}

pub struct ProviderClient {
    client: Client,
    credentials: Option<ProviderCredentials>,
}

impl ProviderClient {
    pub fn new(credentials: Option<ProviderCredentials>, timeout_seconds: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            credentials,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    fn credentials(&self) -> Result<&ProviderCredentials, ProviderError> {
        self.credentials
            .as_ref()
            .ok_or(ProviderError::NotConfigured)
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        operation: &str,
    ) -> Result<Value, ProviderError> {
        let creds = self.credentials()?;
        let request_url = format!("{}{}", creds.base_url, path);
        debug!("{}: GET {}", operation, request_url);

        let response = self
            .client
            .get(&request_url)
            .header("Api-Token", &creds.api_key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            error!("{} failed: authentication rejected (HTTP {})", operation, status);
            return Err(ProviderError::AuthFailure(status.as_u16()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
            error!(
                "{} failed (HTTP {}) | URL: {} | Response: {}",
                operation,
                status,
                request_url,
                if excerpt.is_empty() { "No response body" } else { &excerpt }
            );
            return Err(ProviderError::Upstream {
                status: Some(status.as_u16()),
                body: excerpt,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Validation(format!("{}: {}", operation, e)))
    }
}

#[async_trait]
impl CampaignSource for ProviderClient {
    async fn list_campaigns(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Campaign>, ProviderError> {
        let data = self
            .get_json(
                "/api/3/campaigns",
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
                "Get campaigns",
            )
            .await?;

        let campaigns = data
            .get("campaigns")
            .and_then(Value::as_array)
            .map(|rows| rows.iter().map(normalize_campaign).collect())
            .unwrap_or_default();

        Ok(campaigns)
    }

    async fn get_campaign(&self, id: &str) -> Result<Campaign, ProviderError> {
        let path = format!("/api/3/campaigns/{}", id);
        let data = self.get_json(&path, &[], "Get campaign").await.map_err(|e| {
            // Only the direct fetch knows a 404 means "this campaign".
            match e {
                ProviderError::Upstream {
                    status: Some(404), ..
                } => ProviderError::NotFound(id.to_string()),
                other => other,
            }
        })?;

        let raw = data.get("campaign").cloned().unwrap_or(Value::Null);
        if raw.is_null() {
            return Err(ProviderError::NotFound(id.to_string()));
        }
        Ok(normalize_campaign(&raw))
    }

    async fn get_campaign_links(&self, id: &str) -> Result<Vec<Link>, ProviderError> {
        let path = format!("/api/3/campaigns/{}/links", id);
        let data = self.get_json(&path, &[], "Get campaign links").await?;
        Ok(normalize_links(&data))
    }

    async fn list_subscriber_lists(&self) -> Result<Vec<SubscriberList>, ProviderError> {
        let data = self.get_json("/api/3/lists", &[], "Get lists").await?;

        let lists = data
            .get("lists")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .map(|raw| SubscriberList {
                        id: text(raw.get("id")),
                        name: text(raw.get("name")),
                        subscriber_count: count(raw.get("subscriber_count")),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(lists)
    }
}

/// Coerce an upstream counter to a non-negative integer. The provider
/// sends numbers both as JSON numbers and as strings; absent, null and
/// unparsable values all collapse to 0.
fn count(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0).max(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0).max(0),
        _ => 0,
    }
}

/// Coerce an upstream field to a string, empty when absent or null.
/// Numeric IDs are stringified rather than dropped.
fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Map one raw provider campaign record onto the canonical shape.
/// Every default lives here; a payload of all-null fields normalizes to
/// an all-zero campaign rather than crashing.
fn normalize_campaign(raw: &Value) -> Campaign {
    let sends = count(raw.get("send_amt"));
    let unique_opens = count(raw.get("uniqueopens"));
    let unique_clicks = count(raw.get("uniquelinkclicks"));
    let hard_bounces = count(raw.get("hardbounces"));
    let soft_bounces = count(raw.get("softbounces"));
    let unsubscribes = count(raw.get("unsubscribes"));
    let unique_forwards = count(raw.get("uniqueforwards"));

    Campaign {
        id: text(raw.get("id")),
        name: text(raw.get("name")),
        campaign_type: text(raw.get("type")),
        status: CampaignStatus::from_code(&text(raw.get("status"))),
        send_date: text(raw.get("sdate")),
        created_date: text(raw.get("cdate")),
        subject: text(raw.get("subject")),

        total_sends: sends,
        total_recipients: count(raw.get("total_amt")),

        opens: count(raw.get("opens")),
        unique_opens,
        clicks: count(raw.get("linkclicks")),
        unique_clicks,
        subscriber_clicks: count(raw.get("subscriberclicks")),

        hard_bounces,
        soft_bounces,
        forwards: count(raw.get("forwards")),
        unique_forwards,

        unsubscribes,
        unsub_reasons: count(raw.get("unsubreasons")),
        replies: count(raw.get("replies")),
        unique_replies: count(raw.get("uniquereplies")),
        social_shares: count(raw.get("socialshares")),

        open_rate: rate(Some(unique_opens), Some(sends)),
        click_rate: rate(Some(unique_clicks), Some(sends)),
        click_to_open_rate: rate(Some(unique_clicks), Some(unique_opens)),
        bounce_rate: rate(Some(hard_bounces + soft_bounces), Some(sends)),
        unsubscribe_rate: rate(Some(unsubscribes), Some(sends)),
        forward_rate: rate(Some(unique_forwards), Some(sends)),
    }
}

/// Normalize the links payload and sort by clicks descending. The sort
/// is stable, so ties keep the provider's order.
fn normalize_links(data: &Value) -> Vec<Link> {
    let mut links: Vec<Link> = data
        .get("links")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|raw| Link {
                    id: text(raw.get("id")),
                    url: text(raw.get("link")),
                    name: text(raw.get("name")),
                    clicks: count(raw.get("clicks")),
                    unique_clicks: count(raw.get("uniqueclicks")),
                })
                .collect()
        })
        .unwrap_or_default();

    links.sort_by(|a, b| b.clicks.cmp(&a.clicks));
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_string_typed_counters_and_derives_rates() {
        let raw = json!({
            "id": 330,
            "name": "Editorial Digest #42",
            "type": "single",
            "status": "5",
            "sdate": "2026-01-28T09:00:00-06:00",
            "cdate": "2026-01-21T14:12:03-06:00",
            "subject": "This week in digital",
            "send_amt": "200",
            "total_amt": "210",
            "opens": "95",
            "uniqueopens": "50",
            "linkclicks": "31",
            "uniquelinkclicks": "25",
            "subscriberclicks": "19",
            "hardbounces": "2",
            "softbounces": "1",
            "forwards": "4",
            "uniqueforwards": "3",
            "unsubscribes": "1",
            "unsubreasons": "0",
            "replies": "6",
            "uniquereplies": "5",
            "socialshares": "0"
        });

        let campaign = normalize_campaign(&raw);
        assert_eq!(campaign.id, "330");
        assert_eq!(campaign.status, CampaignStatus::Completed);
        assert_eq!(campaign.total_sends, 200);
        assert_eq!(campaign.unique_opens, 50);
        assert_eq!(campaign.open_rate, 25.0);
        assert_eq!(campaign.click_rate, 12.5);
        assert_eq!(campaign.click_to_open_rate, 50.0);
        assert_eq!(campaign.bounce_rate, 1.5);
        assert_eq!(campaign.unsubscribe_rate, 0.5);
        assert_eq!(campaign.forward_rate, 1.5);
    }

    #[test]
    fn all_null_payload_normalizes_to_defaults() {
        let raw = json!({
            "id": null,
            "name": null,
            "type": null,
            "status": null,
            "sdate": null,
            "cdate": null,
            "send_amt": null,
            "uniqueopens": null,
            "uniquelinkclicks": null,
            "hardbounces": null,
            "softbounces": null,
            "unsubscribes": null,
            "uniqueforwards": null
        });

        let campaign = normalize_campaign(&raw);
        assert_eq!(campaign.id, "");
        assert_eq!(campaign.name, "");
        assert_eq!(campaign.send_date, "");
        assert_eq!(campaign.status, CampaignStatus::Unknown);
        assert_eq!(campaign.total_sends, 0);
        assert_eq!(campaign.open_rate, 0.0);
        assert_eq!(campaign.bounce_rate, 0.0);
    }

    #[test]
    fn unparsable_counters_collapse_to_zero() {
        let raw = json!({ "id": "7", "send_amt": "lots", "uniqueopens": -3 });
        let campaign = normalize_campaign(&raw);
        assert_eq!(campaign.total_sends, 0);
        assert_eq!(campaign.unique_opens, 0);
    }

    #[test]
    fn links_sort_by_clicks_descending_stable() {
        let data = json!({
            "links": [
                { "id": "1", "link": "https://a.example", "name": "a", "clicks": "3", "uniqueclicks": "2" },
                { "id": "2", "link": "https://b.example", "name": "b", "clicks": "9", "uniqueclicks": "7" },
                { "id": "3", "link": "https://c.example", "name": "c", "clicks": "3", "uniqueclicks": "1" }
            ]
        });

        let links = normalize_links(&data);
        let ids: Vec<&str> = links.iter().map(|l| l.id.as_str()).collect();
        // link 1 ties with link 3 and keeps its earlier position
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[test]
    fn missing_links_array_is_empty_not_an_error() {
        assert!(normalize_links(&json!({})).is_empty());
    }
}
