//! Predicate deciding which campaigns belong to the tracked
//! Editorial Digest family. Pure and side-effect free so it can be
//! unit-tested without touching the provider.

use serde::{Deserialize, Serialize};

use crate::models::Campaign;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Allow-listed campaign IDs, in configuration order, deduplicated.
    pub allowed_ids: Vec<String>,
    /// Case-insensitive substring matched against the campaign name.
    pub name_pattern: String,
}

impl FilterConfig {
    /// Build from the configuration surface: a comma-separated ID list
    /// plus an optional name pattern. IDs are trimmed, empties dropped
    /// and duplicates removed while preserving first-seen order.
    pub fn from_parts(ids_csv: &str, name_pattern: &str) -> Self {
        let mut allowed_ids: Vec<String> = Vec::new();
        for raw in ids_csv.split(',') {
            let id = raw.trim();
            if !id.is_empty() && !allowed_ids.iter().any(|seen| seen == id) {
                allowed_ids.push(id.to_string());
            }
        }
        Self {
            allowed_ids,
            name_pattern: name_pattern.trim().to_string(),
        }
    }

    /// True when neither an allow-list nor a pattern is configured.
    /// An open filter accepts everything (backward compatibility).
    pub fn is_open(&self) -> bool {
        self.allowed_ids.is_empty() && self.name_pattern.is_empty()
    }

    /// Whether a campaign belongs to the tracked family: allow-list
    /// membership OR name-pattern substring, fail-open when unconfigured.
    pub fn accepts(&self, campaign_id: &str, campaign_name: &str) -> bool {
        if self.is_open() {
            return true;
        }

        let id = campaign_id.trim();
        if !self.allowed_ids.is_empty() && self.allowed_ids.iter().any(|allowed| allowed == id) {
            return true;
        }

        if !self.name_pattern.is_empty() && !campaign_name.is_empty() {
            let pattern = self.name_pattern.to_lowercase();
            if campaign_name.to_lowercase().contains(&pattern) {
                return true;
            }
        }

        false
    }

    /// Keep only accepted campaigns, preserving input order.
    pub fn filter_all(&self, campaigns: Vec<Campaign>) -> Vec<Campaign> {
        if self.is_open() {
            return campaigns;
        }
        campaigns
            .into_iter()
            .filter(|c| self.accepts(&c.id, &c.name))
            .collect()
    }
}
