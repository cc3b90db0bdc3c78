// src/server/routes.rs
// This file can contain additional route configurations if needed
// For now, all routes are defined in their respective API modules

pub mod health {
    use rocket::{get, serde::json::Json};
    use serde_json::{json, Value};

    #[get("/health")]
    pub async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "service": "campaign-digest-api"
        }))
    }

    #[get("/")]
    pub async fn index() -> Json<Value> {
        Json(json!({
            "name": "Campaign Digest API",
            "version": "0.1.0",
            "description": "Campaign analytics and scheduled content ingestion",
            "endpoints": {
                "health": "/api/health",
                "campaigns": "/api/analytics/campaigns",
                "all_campaigns": "/api/analytics/campaigns/all",
                "campaign_report": "/api/analytics/campaigns/<id>",
                "campaign_links": "/api/analytics/campaigns/<id>/links",
                "lists": "/api/analytics/lists",
                "ingestion_run": "/api/ingestion/run",
                "ingestion_status": "/api/ingestion/status"
            }
        }))
    }
}
