// src/api/ingestion.rs
use rocket::http::Status;
use rocket::response::status;
use rocket::{get, post, serde::json::Json, State};
use serde::Serialize;

use crate::api::ApiResponse;
use crate::ingestion::RunOutcome;
use crate::models::IngestionRun;
use crate::scheduler::SchedulerStatus;
use crate::server::ServerState;

#[derive(Serialize)]
pub struct RunPayload {
    pub record: Option<IngestionRun>,
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionStatusPayload {
    pub running: bool,
    pub scheduler: SchedulerStatus,
    pub recent_runs: Vec<IngestionRun>,
}

/// Kick off an ingestion run on demand. A run already in flight is
/// reported as a conflict rather than queued behind it.
#[post("/ingestion/run")]
pub async fn trigger_ingestion(
    state: &State<ServerState>,
) -> status::Custom<Json<ApiResponse<RunPayload>>> {
    match state.orchestrator.run().await {
        Ok(RunOutcome::AlreadyRunning) => status::Custom(
            Status::Conflict,
            Json(ApiResponse::error("ingestion already running".to_string())),
        ),
        Ok(RunOutcome::NoPillars) => status::Custom(
            Status::Ok,
            Json(ApiResponse::success(RunPayload {
                record: None,
                message: "no pillars configured".to_string(),
            })),
        ),
        Ok(RunOutcome::Finished(record)) => status::Custom(
            Status::Ok,
            Json(ApiResponse::success(RunPayload {
                record: Some(record),
                message: "ingestion completed".to_string(),
            })),
        ),
        Err(e) => status::Custom(
            Status::InternalServerError,
            Json(ApiResponse::error(e.to_string())),
        ),
    }
}

#[get("/ingestion/status")]
pub async fn get_ingestion_status(
    state: &State<ServerState>,
) -> status::Custom<Json<ApiResponse<IngestionStatusPayload>>> {
    let scheduler = state.scheduler.status().await;
    let recent_runs = match state.store.recent_runs(10).await {
        Ok(runs) => runs,
        Err(e) => {
            return status::Custom(
                Status::InternalServerError,
                Json(ApiResponse::error(e.to_string())),
            )
        }
    };

    status::Custom(
        Status::Ok,
        Json(ApiResponse::success(IngestionStatusPayload {
            running: state.orchestrator.is_running(),
            scheduler,
            recent_runs,
        })),
    )
}
