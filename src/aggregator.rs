//! Read-side orchestration over the provider: pagination, access
//! filtering, per-id checks and the merged enumeration used by the API.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::filter::FilterConfig;
use crate::models::{Campaign, CampaignStatus, Link};
use crate::provider::CampaignSource;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub limit: usize,
    pub offset: usize,
    pub pages_fetched: usize,
    pub total: usize,
}

/// Outcome of probing one explicitly requested campaign id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckError {
    pub id: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignEnumeration {
    pub campaigns: Vec<Campaign>,
    pub pagination: PageInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub check_errors: Vec<CheckError>,
}

pub struct CampaignAggregator {
    source: Arc<dyn CampaignSource>,
    filter: FilterConfig,
    page_size: usize,
}

impl CampaignAggregator {
    pub fn new(source: Arc<dyn CampaignSource>, filter: FilterConfig, page_size: usize) -> Self {
        Self {
            source,
            filter,
            page_size,
        }
    }

    /// Campaigns visible through the access filter.
    ///
    /// With a non-empty allow-list each id is fetched directly; a
    /// failing id is logged and skipped rather than failing the whole
    /// call. Without one, a single provider page is fetched and
    /// filtered.
    pub async fn get_filtered_campaigns(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Campaign>, ProviderError> {
        if !self.filter.allowed_ids.is_empty() {
            let mut campaigns = Vec::with_capacity(self.filter.allowed_ids.len());
            for id in &self.filter.allowed_ids {
                match self.source.get_campaign(id).await {
                    Ok(campaign) => campaigns.push(campaign),
                    Err(e) => {
                        warn!("⚠️ Skipping campaign {}: {}", id, e);
                    }
                }
            }
            return Ok(campaigns);
        }

        let page = self.source.list_campaigns(limit, offset).await?;
        Ok(self.filter.filter_all(page))
    }

    /// Full enumeration for the admin view: paged listing, optional
    /// exhaustive paging, explicit id probes, search, dedupe and sort.
    pub async fn enumerate_campaigns(
        &self,
        limit: usize,
        offset: usize,
        search: Option<&str>,
        check_ids: &[String],
        fetch_all: bool,
    ) -> Result<CampaignEnumeration, ProviderError> {
        let page_limit = if limit == 0 { self.page_size } else { limit };
        let mut campaigns = Vec::new();
        let mut pages_fetched = 0usize;
        let mut page_offset = offset;

        loop {
            let page = self.source.list_campaigns(page_limit, page_offset).await?;
            pages_fetched += 1;
            let page_len = page.len();
            campaigns.extend(page);
            debug!("Fetched page {} ({} campaigns)", pages_fetched, page_len);
            if !fetch_all || page_len < page_limit {
                break;
            }
            page_offset += page_limit;
        }

        let mut check_errors = Vec::new();
        for id in check_ids {
            match self.source.get_campaign(id).await {
                Ok(campaign) => campaigns.push(campaign),
                Err(ProviderError::NotFound(_)) => {
                    // keep a placeholder row so the id is visible in the output
                    campaigns.push(Campaign {
                        id: id.clone(),
                        name: "(not found)".to_string(),
                        status: CampaignStatus::Unknown,
                        ..Default::default()
                    });
                }
                Err(e) => {
                    warn!("Check for campaign {} failed: {}", id, e);
                    check_errors.push(CheckError {
                        id: id.clone(),
                        error: e.to_string(),
                        status: e.status_code(),
                    });
                }
            }
        }

        if let Some(needle) = search {
            let needle = needle.to_lowercase();
            campaigns.retain(|c| c.name.to_lowercase().contains(&needle));
        }

        // first occurrence wins: paged results shadow checked duplicates
        let mut seen = HashSet::new();
        campaigns.retain(|c| seen.insert(c.id.clone()));

        // newest first; empty send dates sort last
        campaigns.sort_by(|a, b| b.send_date.cmp(&a.send_date));

        let total = campaigns.len();
        info!("📊 Enumerated {} campaigns across {} page(s)", total, pages_fetched);

        Ok(CampaignEnumeration {
            campaigns,
            pagination: PageInfo {
                limit: page_limit,
                offset,
                pages_fetched,
                total,
            },
            check_errors,
        })
    }

    /// One campaign, gated by the access filter. A campaign the filter
    /// rejects reports as not found rather than leaking its existence.
    pub async fn get_campaign_report(&self, id: &str) -> Result<Campaign, ProviderError> {
        let campaign = self.source.get_campaign(id).await?;
        if !self.filter.accepts(&campaign.id, &campaign.name) {
            return Err(ProviderError::NotFound(id.to_string()));
        }
        Ok(campaign)
    }

    /// Links for one campaign, behind the same access gate as the report.
    pub async fn get_campaign_links(&self, id: &str) -> Result<Vec<Link>, ProviderError> {
        let campaign = self.source.get_campaign(id).await?;
        if !self.filter.accepts(&campaign.id, &campaign.name) {
            return Err(ProviderError::NotFound(id.to_string()));
        }
        self.source.get_campaign_links(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct MockSource {
        pages: Vec<Vec<Campaign>>,
        by_id: HashMap<String, Campaign>,
        failing_ids: HashMap<String, ProviderError>,
    }

    impl MockSource {
        fn empty() -> Self {
            Self {
                pages: vec![Vec::new()],
                by_id: HashMap::new(),
                failing_ids: HashMap::new(),
            }
        }

        fn with_pages(pages: Vec<Vec<Campaign>>) -> Self {
            Self {
                pages,
                by_id: HashMap::new(),
                failing_ids: HashMap::new(),
            }
        }
    }

    #[async_trait]
    impl CampaignSource for MockSource {
        async fn list_campaigns(
            &self,
            limit: usize,
            offset: usize,
        ) -> Result<Vec<Campaign>, ProviderError> {
            let index = offset / limit.max(1);
            Ok(self.pages.get(index).cloned().unwrap_or_default())
        }

        async fn get_campaign(&self, id: &str) -> Result<Campaign, ProviderError> {
            if let Some(err) = self.failing_ids.get(id) {
                return Err(clone_error(err));
            }
            self.by_id
                .get(id)
                .cloned()
                .ok_or_else(|| ProviderError::NotFound(id.to_string()))
        }

        async fn get_campaign_links(&self, _id: &str) -> Result<Vec<Link>, ProviderError> {
            Ok(Vec::new())
        }

        async fn list_subscriber_lists(
            &self,
        ) -> Result<Vec<crate::models::SubscriberList>, ProviderError> {
            Ok(Vec::new())
        }
    }

    fn clone_error(e: &ProviderError) -> ProviderError {
        match e {
            ProviderError::NotConfigured => ProviderError::NotConfigured,
            ProviderError::AuthFailure(s) => ProviderError::AuthFailure(*s),
            ProviderError::NotFound(id) => ProviderError::NotFound(id.clone()),
            ProviderError::Upstream { status, body } => ProviderError::Upstream {
                status: *status,
                body: body.clone(),
            },
            ProviderError::Validation(m) => ProviderError::Validation(m.clone()),
        }
    }

    fn campaign(id: &str, name: &str, send_date: &str) -> Campaign {
        Campaign {
            id: id.to_string(),
            name: name.to_string(),
            send_date: send_date.to_string(),
            ..Default::default()
        }
    }

    fn page_of(start: usize, count: usize) -> Vec<Campaign> {
        (start..start + count)
            .map(|i| campaign(&i.to_string(), &format!("Campaign {}", i), "2026-01-01"))
            .collect()
    }

    fn aggregator(source: MockSource, filter: FilterConfig) -> CampaignAggregator {
        CampaignAggregator::new(Arc::new(source), filter, 500)
    }

    #[tokio::test]
    async fn fetch_all_walks_pages_until_short_page() {
        let source =
            MockSource::with_pages(vec![page_of(0, 500), page_of(500, 500), page_of(1000, 137)]);
        let agg = aggregator(source, FilterConfig::from_parts("", ""));

        let result = agg
            .enumerate_campaigns(500, 0, None, &[], true)
            .await
            .unwrap();

        assert_eq!(result.pagination.pages_fetched, 3);
        assert_eq!(result.pagination.total, 1137);
    }

    #[tokio::test]
    async fn single_page_without_fetch_all() {
        let source = MockSource::with_pages(vec![page_of(0, 500), page_of(500, 500)]);
        let agg = aggregator(source, FilterConfig::from_parts("", ""));

        let result = agg
            .enumerate_campaigns(500, 0, None, &[], false)
            .await
            .unwrap();

        assert_eq!(result.pagination.pages_fetched, 1);
        assert_eq!(result.pagination.total, 500);
    }

    #[tokio::test]
    async fn checked_ids_dedupe_against_page_first_wins() {
        let mut source = MockSource::with_pages(vec![vec![campaign("330", "From page", "2026-02-01")]]);
        source
            .by_id
            .insert("330".into(), campaign("330", "From check", "2026-02-01"));

        let agg = aggregator(source, FilterConfig::from_parts("", ""));
        let result = agg
            .enumerate_campaigns(500, 0, None, &["330".to_string()], false)
            .await
            .unwrap();

        assert_eq!(result.campaigns.len(), 1);
        assert_eq!(result.campaigns[0].name, "From page");
    }

    #[tokio::test]
    async fn checked_missing_id_becomes_placeholder() {
        let agg = aggregator(MockSource::empty(), FilterConfig::from_parts("", ""));
        let result = agg
            .enumerate_campaigns(500, 0, None, &["999".to_string()], false)
            .await
            .unwrap();

        assert_eq!(result.campaigns.len(), 1);
        assert_eq!(result.campaigns[0].id, "999");
        assert_eq!(result.campaigns[0].name, "(not found)");
        assert!(result.check_errors.is_empty());
    }

    #[tokio::test]
    async fn checked_upstream_failure_is_reported_not_fatal() {
        let mut source = MockSource::empty();
        source.failing_ids.insert(
            "42".into(),
            ProviderError::Upstream {
                status: Some(500),
                body: "boom".into(),
            },
        );

        let agg = aggregator(source, FilterConfig::from_parts("", ""));
        let result = agg
            .enumerate_campaigns(500, 0, None, &["42".to_string()], false)
            .await
            .unwrap();

        assert!(result.campaigns.is_empty());
        assert_eq!(result.check_errors.len(), 1);
        assert_eq!(result.check_errors[0].id, "42");
        assert_eq!(result.check_errors[0].status, Some(500));
    }

    #[tokio::test]
    async fn search_filters_by_name_case_insensitive() {
        let source = MockSource::with_pages(vec![vec![
            campaign("1", "Weekly Newsletter #9", "2026-01-02"),
            campaign("2", "Product Launch", "2026-01-03"),
        ]]);
        let agg = aggregator(source, FilterConfig::from_parts("", ""));

        let result = agg
            .enumerate_campaigns(500, 0, Some("newsletter"), &[], false)
            .await
            .unwrap();

        assert_eq!(result.campaigns.len(), 1);
        assert_eq!(result.campaigns[0].id, "1");
    }

    #[tokio::test]
    async fn sorted_newest_first_with_empty_dates_last() {
        let source = MockSource::with_pages(vec![vec![
            campaign("a", "A", ""),
            campaign("b", "B", "2026-03-01"),
            campaign("c", "C", "2026-01-15"),
        ]]);
        let agg = aggregator(source, FilterConfig::from_parts("", ""));

        let result = agg
            .enumerate_campaigns(500, 0, None, &[], false)
            .await
            .unwrap();

        let ids: Vec<&str> = result.campaigns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn allow_list_fetches_ids_directly_and_skips_failures() {
        let mut source = MockSource::empty();
        source
            .by_id
            .insert("330".into(), campaign("330", "Kept", "2026-01-01"));
        source.failing_ids.insert(
            "329".into(),
            ProviderError::Upstream {
                status: Some(500),
                body: "down".into(),
            },
        );

        let agg = aggregator(source, FilterConfig::from_parts("330, 329", ""));
        let campaigns = agg.get_filtered_campaigns(100, 0).await.unwrap();

        assert_eq!(campaigns.len(), 1);
        assert_eq!(campaigns[0].id, "330");
    }

    #[tokio::test]
    async fn open_filter_lists_a_page() {
        let source = MockSource::with_pages(vec![page_of(0, 3)]);
        let agg = aggregator(source, FilterConfig::from_parts("", ""));
        let campaigns = agg.get_filtered_campaigns(100, 0).await.unwrap();
        assert_eq!(campaigns.len(), 3);
    }

    #[tokio::test]
    async fn report_for_filtered_out_campaign_is_not_found() {
        let mut source = MockSource::empty();
        source
            .by_id
            .insert("7".into(), campaign("7", "Internal Test Blast", "2026-01-01"));

        let agg = aggregator(source, FilterConfig::from_parts("", "newsletter"));
        let err = agg.get_campaign_report("7").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn report_passes_the_filter_gate() {
        let mut source = MockSource::empty();
        source
            .by_id
            .insert("8".into(), campaign("8", "Weekly Newsletter #3", "2026-01-01"));

        let agg = aggregator(source, FilterConfig::from_parts("", "newsletter"));
        let campaign = agg.get_campaign_report("8").await.unwrap();
        assert_eq!(campaign.id, "8");
    }
}
