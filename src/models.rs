use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Lifecycle of a campaign, mapped from the provider's numeric status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Sending,
    Paused,
    Stopped,
    Completed,
    #[default]
    Unknown,
}

impl CampaignStatus {
    /// Total mapping from the provider's status code. Anything outside the
    /// known set (including garbage) comes back as `Unknown`, never an error.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "0" => CampaignStatus::Draft,
            "1" => CampaignStatus::Scheduled,
            "2" => CampaignStatus::Sending,
            "3" => CampaignStatus::Paused,
            "4" => CampaignStatus::Stopped,
            "5" => CampaignStatus::Completed,
            _ => CampaignStatus::Unknown,
        }
    }
}

/// One outbound email send with its engagement counters and derived rates.
///
/// Date fields are opaque provider strings, passed through verbatim and
/// empty when absent (never null). Counters default to 0; rates live in
/// [0, 100] and are rounded to 2 decimals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub campaign_type: String,
    pub status: CampaignStatus,
    pub send_date: String,
    pub created_date: String,
    pub subject: String,

    pub total_sends: i64,
    pub total_recipients: i64,

    pub opens: i64,
    pub unique_opens: i64,
    pub clicks: i64,
    pub unique_clicks: i64,
    pub subscriber_clicks: i64,

    pub hard_bounces: i64,
    pub soft_bounces: i64,
    pub forwards: i64,
    pub unique_forwards: i64,

    pub unsubscribes: i64,
    pub unsub_reasons: i64,
    pub replies: i64,
    pub unique_replies: i64,
    pub social_shares: i64,

    pub open_rate: f64,
    pub click_rate: f64,
    pub click_to_open_rate: f64,
    pub bounce_rate: f64,
    pub unsubscribe_rate: f64,
    pub forward_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub url: String,
    pub name: String,
    pub clicks: i64,
    pub unique_clicks: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberList {
    pub id: String,
    pub name: String,
    pub subscriber_count: i64,
}

/// A refreshed content item produced by the refresh collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub category: String,
    pub title: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub why_it_matters: Option<String>,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A tracked topical category whose content is refreshed on schedule.
/// `news_items` is replaced wholesale on every successful refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pillar {
    pub id: String,
    pub name: String,
    pub keywords: Vec<String>,
    pub news_items: Vec<NewsItem>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Partial,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        }
    }

    /// Anything unrecognized reads back as failed.
    pub fn from_str(s: &str) -> Self {
        match s {
            "success" => RunStatus::Success,
            "partial" => RunStatus::Partial,
            _ => RunStatus::Failed,
        }
    }
}

/// Append-only audit record, one per ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionRun {
    pub id: String,
    pub job_name: String,
    pub status: RunStatus,
    pub total_entities: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub created_at: DateTime<Utc>,
}
