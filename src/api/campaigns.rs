// src/api/campaigns.rs
use rocket::http::Status;
use rocket::response::status;
use rocket::{get, serde::json::Json, State};
use serde::Serialize;

use crate::aggregator::CampaignEnumeration;
use crate::api::{provider_error_status, ApiResponse};
use crate::error::ProviderError;
use crate::models::{Campaign, Link};
use crate::server::ServerState;

#[derive(Serialize)]
pub struct CampaignsPayload {
    pub campaigns: Vec<Campaign>,
    pub total: usize,
}

#[derive(Serialize)]
pub struct ReportPayload {
    pub campaign: Campaign,
}

#[derive(Serialize)]
pub struct LinksPayload {
    pub links: Vec<Link>,
}

type ApiResult<T> = status::Custom<Json<ApiResponse<T>>>;

fn ok<T>(data: T) -> ApiResult<T> {
    status::Custom(Status::Ok, Json(ApiResponse::success(data)))
}

fn fail<T>(e: ProviderError) -> ApiResult<T> {
    status::Custom(
        provider_error_status(&e),
        Json(ApiResponse::error(e.to_string())),
    )
}

/// Campaigns visible through the configured access filter.
#[get("/analytics/campaigns?<limit>&<offset>")]
pub async fn get_campaigns(
    state: &State<ServerState>,
    limit: Option<usize>,
    offset: Option<usize>,
) -> ApiResult<CampaignsPayload> {
    let limit = limit.unwrap_or(state.config.provider.page_size);
    let offset = offset.unwrap_or(0);

    match state.aggregator.get_filtered_campaigns(limit, offset).await {
        Ok(campaigns) => {
            let total = campaigns.len();
            ok(CampaignsPayload { campaigns, total })
        }
        Err(e) => fail(e),
    }
}

/// Unfiltered enumeration for admin tooling: paging, optional
/// exhaustive fetch, explicit id probes and name search.
#[get("/analytics/campaigns/all?<limit>&<offset>&<search>&<check_ids>&<fetch_all>")]
pub async fn get_all_campaigns(
    state: &State<ServerState>,
    limit: Option<usize>,
    offset: Option<usize>,
    search: Option<String>,
    check_ids: Option<String>,
    fetch_all: Option<bool>,
) -> ApiResult<CampaignEnumeration> {
    let ids: Vec<String> = check_ids
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    match state
        .aggregator
        .enumerate_campaigns(
            limit.unwrap_or(state.config.provider.page_size),
            offset.unwrap_or(0),
            search.as_deref(),
            &ids,
            fetch_all.unwrap_or(false),
        )
        .await
    {
        Ok(enumeration) => ok(enumeration),
        Err(e) => fail(e),
    }
}

#[get("/analytics/campaigns/<id>")]
pub async fn get_campaign_report(
    state: &State<ServerState>,
    id: &str,
) -> ApiResult<ReportPayload> {
    match state.aggregator.get_campaign_report(id).await {
        Ok(campaign) => ok(ReportPayload { campaign }),
        Err(e) => fail(e),
    }
}

#[get("/analytics/campaigns/<id>/links")]
pub async fn get_campaign_links(
    state: &State<ServerState>,
    id: &str,
) -> ApiResult<LinksPayload> {
    match state.aggregator.get_campaign_links(id).await {
        Ok(links) => ok(LinksPayload { links }),
        Err(e) => fail(e),
    }
}
