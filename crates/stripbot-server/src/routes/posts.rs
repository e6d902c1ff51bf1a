//! Post query and engagement route handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use stripbot_core::PostId;
use stripbot_db::models::EngagementUpdate;

use crate::context::AppContext;
use crate::error::AppError;

/// Query parameters for listing posts.
#[derive(Debug, Deserialize)]
pub struct ListPostsParams {
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

/// Post response.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: String,
    pub strip_date: String,
    pub bluesky_uri: String,
    pub bluesky_cid: String,
    pub post_text: String,
    pub posted_at: String,
    pub likes: i64,
    pub reposts: i64,
    pub replies: i64,
}

impl PostResponse {
    fn from_model(post: &stripbot_db::models::Post) -> Self {
        Self {
            id: post.id.to_string(),
            strip_date: post.strip_date.format("%Y-%m-%d").to_string(),
            bluesky_uri: post.bluesky_uri.clone(),
            bluesky_cid: post.bluesky_cid.clone(),
            post_text: post.post_text.clone(),
            posted_at: post.posted_at.clone(),
            likes: post.likes,
            reposts: post.reposts,
            replies: post.replies,
        }
    }
}

/// Post detail response including engagement and the comic it links to.
#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub engagement: i64,
    pub comic_title: Option<String>,
    pub comic_date: String,
}

/// GET /api/posts
pub async fn list_posts(
    State(ctx): State<AppContext>,
    Query(params): Query<ListPostsParams>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let posts = ctx.records.list_posts(params.offset, params.limit)?;
    let responses: Vec<PostResponse> = posts.iter().map(PostResponse::from_model).collect();
    Ok(Json(responses))
}

fn parse_post_id(id: &str) -> Result<PostId, stripbot_core::Error> {
    id.parse()
        .map_err(|_| stripbot_core::Error::Validation("Invalid post ID".into()))
}

/// GET /api/posts/:id
pub async fn get_post(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<PostDetailResponse>, AppError> {
    let post_id = parse_post_id(&id)?;
    let post = ctx
        .records
        .get_post(post_id)?
        .ok_or_else(|| stripbot_core::Error::not_found("post", post_id))?;

    let comic = ctx.records.get_comic(post.strip_date)?;

    Ok(Json(PostDetailResponse {
        engagement: post.engagement(),
        comic_title: comic.and_then(|c| c.title),
        comic_date: post.strip_date.format("%Y-%m-%d").to_string(),
        post: PostResponse::from_model(&post),
    }))
}

/// PUT /api/posts/:id
pub async fn update_post(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(update): Json<EngagementUpdate>,
) -> Result<Json<PostResponse>, AppError> {
    let post_id = parse_post_id(&id)?;
    if update.is_empty() {
        return Err(stripbot_core::Error::Validation("No fields to update".into()).into());
    }
    let post = ctx
        .records
        .update_engagement(post_id, &update)?
        .ok_or_else(|| stripbot_core::Error::not_found("post", post_id))?;
    Ok(Json(PostResponse::from_model(&post)))
}

/// DELETE /api/posts/:id
pub async fn delete_post(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let post_id = parse_post_id(&id)?;
    if !ctx.records.delete_post(post_id)? {
        return Err(stripbot_core::Error::not_found("post", post_id).into());
    }
    Ok(Json(serde_json::json!({ "message": "Post deleted" })))
}
