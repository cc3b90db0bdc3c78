// src/api/lists.rs
use rocket::http::Status;
use rocket::response::status;
use rocket::{get, serde::json::Json, State};
use serde::Serialize;

use crate::api::{provider_error_status, ApiResponse};
use crate::models::SubscriberList;
use crate::server::ServerState;

#[derive(Serialize)]
pub struct ListsPayload {
    pub lists: Vec<SubscriberList>,
    pub total: usize,
}

#[get("/analytics/lists")]
pub async fn get_subscriber_lists(
    state: &State<ServerState>,
) -> status::Custom<Json<ApiResponse<ListsPayload>>> {
    match state.provider.list_subscriber_lists().await {
        Ok(lists) => {
            let total = lists.len();
            status::Custom(
                Status::Ok,
                Json(ApiResponse::success(ListsPayload { lists, total })),
            )
        }
        Err(e) => status::Custom(
            provider_error_status(&e),
            Json(ApiResponse::error(e.to_string())),
        ),
    }
}
