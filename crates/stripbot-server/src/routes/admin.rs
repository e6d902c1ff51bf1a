//! Admin trigger and statistics route handlers.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use stripbot_db::models::PostStats;

use crate::context::AppContext;
use crate::error::AppError;
use crate::scheduler;

/// Query parameters for the manual fetch trigger.
#[derive(Debug, Deserialize)]
pub struct FetchComicsParams {
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    7
}

/// POST /api/admin/fetch-comics
pub async fn fetch_comics(
    State(ctx): State<AppContext>,
    Query(params): Query<FetchComicsParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let stored = scheduler::fetch_new_comics(&ctx, params.days).await?;
    Ok(Json(serde_json::json!({
        "message": format!("Fetched comics for the last {} days", params.days),
        "stored": stored,
    })))
}

/// POST /api/admin/create-post
pub async fn create_post(
    State(ctx): State<AppContext>,
) -> Result<Json<serde_json::Value>, AppError> {
    match scheduler::create_post(&ctx).await? {
        Some(post) => Ok(Json(serde_json::json!({
            "message": "Post created",
            "post_id": post.id.to_string(),
            "bluesky_uri": post.bluesky_uri,
        }))),
        None => Ok(Json(serde_json::json!({
            "message": "No unposted comics available",
        }))),
    }
}

/// GET /api/admin/statistics
pub async fn statistics(State(ctx): State<AppContext>) -> Result<Json<PostStats>, AppError> {
    Ok(Json(ctx.records.post_stats()?))
}

/// System health summary.
#[derive(Debug, Serialize)]
pub struct SystemStatusResponse {
    pub record_store: ComponentStatus,
    pub image_storage: ComponentStatus,
    pub bluesky_connection: bool,
}

#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub backend: &'static str,
    pub healthy: bool,
}

/// GET /api/admin/system-status
pub async fn system_status(State(ctx): State<AppContext>) -> Json<SystemStatusResponse> {
    let records_healthy = ctx.records.comic_counts().is_ok();
    let storage_healthy = ctx.images.healthy().await;
    let bluesky_connection = ctx.bluesky.check_login().await;

    Json(SystemStatusResponse {
        record_store: ComponentStatus {
            backend: ctx.records.backend_name(),
            healthy: records_healthy,
        },
        image_storage: ComponentStatus {
            backend: ctx.images.backend_name(),
            healthy: storage_healthy,
        },
        bluesky_connection,
    })
}
