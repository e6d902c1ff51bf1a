//! Health and status route handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::context::AppContext;
use crate::error::AppError;

/// GET /health
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Comic count summary.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub total_comics: i64,
    pub posted_comics: i64,
    pub unposted_comics: i64,
}

/// GET /api/status
pub async fn api_status(State(ctx): State<AppContext>) -> Result<Json<StatusResponse>, AppError> {
    let counts = ctx.records.comic_counts()?;
    Ok(Json(StatusResponse {
        total_comics: counts.total,
        posted_comics: counts.posted,
        unposted_comics: counts.unposted(),
    }))
}
