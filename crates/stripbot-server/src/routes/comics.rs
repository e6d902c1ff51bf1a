//! Comic query route handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;

/// Query parameters for listing comics.
#[derive(Debug, Deserialize)]
pub struct ListComicsParams {
    pub posted: Option<bool>,
    #[serde(default = "default_offset")]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_offset() -> i64 {
    0
}

fn default_limit() -> i64 {
    100
}

/// Comic response.
#[derive(Debug, Serialize)]
pub struct ComicResponse {
    pub strip_date: String,
    pub image_url: String,
    pub title: Option<String>,
    pub storage_path: String,
    pub posted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl ComicResponse {
    fn from_model(comic: &stripbot_db::models::Comic) -> Self {
        Self {
            strip_date: comic.strip_date.format("%Y-%m-%d").to_string(),
            image_url: comic.image_url.clone(),
            title: comic.title.clone(),
            storage_path: comic.storage_path.clone(),
            posted: comic.posted,
            created_at: comic.created_at.clone(),
            updated_at: comic.updated_at.clone(),
        }
    }
}

/// GET /api/comics
pub async fn list_comics(
    State(ctx): State<AppContext>,
    Query(params): Query<ListComicsParams>,
) -> Result<Json<Vec<ComicResponse>>, AppError> {
    let comics = ctx
        .records
        .list_comics(params.posted, params.offset, params.limit)?;
    let responses: Vec<ComicResponse> = comics.iter().map(ComicResponse::from_model).collect();
    Ok(Json(responses))
}

/// GET /api/comics/:date
pub async fn get_comic(
    State(ctx): State<AppContext>,
    Path(date): Path<String>,
) -> Result<Json<ComicResponse>, AppError> {
    let date: NaiveDate = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| stripbot_core::Error::Validation("Invalid date, expected YYYY-MM-DD".into()))?;

    let comic = ctx
        .records
        .get_comic(date)?
        .ok_or_else(|| stripbot_core::Error::not_found("comic", date))?;

    Ok(Json(ComicResponse::from_model(&comic)))
}
