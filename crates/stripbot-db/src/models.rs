//! Rust structs mapping to record-store entries.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`; the same structs serialize to JSON for the sled backend.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stripbot_core::PostId;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(T::from(uuid))
}

/// Parse a `YYYY-MM-DD` strip date from a text column.
fn parse_date(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ---------------------------------------------------------------------------
// Comic
// ---------------------------------------------------------------------------

/// A fetched comic strip. Keyed by its original publication date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comic {
    pub strip_date: NaiveDate,
    /// Source URL the image was scraped from.
    pub image_url: String,
    pub title: Option<String>,
    /// Where the image lives: a relative path (local) or `s3://bucket/key`.
    pub storage_path: String,
    pub posted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Comic {
    /// Build from a row selected as:
    /// strip_date, image_url, title, storage_path, posted, created_at, updated_at
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            strip_date: parse_date(row, 0)?,
            image_url: row.get(1)?,
            title: row.get(2)?,
            storage_path: row.get(3)?,
            posted: row.get::<_, i64>(4)? != 0,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

/// Input for inserting a comic.
#[derive(Debug, Clone)]
pub struct NewComic {
    pub strip_date: NaiveDate,
    pub image_url: String,
    pub title: Option<String>,
    pub storage_path: String,
}

/// Total and posted comic counts.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ComicCounts {
    pub total: i64,
    pub posted: i64,
}

impl ComicCounts {
    pub fn unposted(&self) -> i64 {
        self.total - self.posted
    }
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// A published Bluesky post for a comic, with engagement counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub strip_date: NaiveDate,
    /// AT URI of the record (`at://did/app.bsky.feed.post/rkey`).
    pub bluesky_uri: String,
    pub bluesky_cid: String,
    pub post_text: String,
    pub posted_at: String,
    pub likes: i64,
    pub reposts: i64,
    pub replies: i64,
}

impl Post {
    /// Build from a row selected as:
    /// id, strip_date, bluesky_uri, bluesky_cid, post_text, posted_at,
    /// likes, reposts, replies
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            strip_date: parse_date(row, 1)?,
            bluesky_uri: row.get(2)?,
            bluesky_cid: row.get(3)?,
            post_text: row.get(4)?,
            posted_at: row.get(5)?,
            likes: row.get(6)?,
            reposts: row.get(7)?,
            replies: row.get(8)?,
        })
    }

    /// Sum of all engagement counters.
    pub fn engagement(&self) -> i64 {
        self.likes + self.reposts + self.replies
    }
}

/// Input for recording a published post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub strip_date: NaiveDate,
    pub bluesky_uri: String,
    pub bluesky_cid: String,
    pub post_text: String,
}

/// Partial engagement update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngagementUpdate {
    pub post_text: Option<String>,
    pub likes: Option<i64>,
    pub reposts: Option<i64>,
    pub replies: Option<i64>,
}

impl EngagementUpdate {
    /// True when every field is `None`.
    pub fn is_empty(&self) -> bool {
        self.post_text.is_none()
            && self.likes.is_none()
            && self.reposts.is_none()
            && self.replies.is_none()
    }
}

/// Aggregate posting statistics.
#[derive(Debug, Clone, Serialize)]
pub struct PostStats {
    pub total_posts: i64,
    pub total_likes: i64,
    pub total_reposts: i64,
    pub total_replies: i64,
    /// Mean of per-post engagement sums; 0.0 when there are no posts.
    pub average_engagement: f64,
    pub most_popular: Option<Post>,
    pub last_posted_at: Option<String>,
}

impl PostStats {
    pub fn empty() -> Self {
        Self {
            total_posts: 0,
            total_likes: 0,
            total_reposts: 0,
            total_replies: 0,
            average_engagement: 0.0,
            most_popular: None,
            last_posted_at: None,
        }
    }

    /// Compute stats from a full post list (used by the sled backend).
    pub fn from_posts(posts: &[Post]) -> Self {
        if posts.is_empty() {
            return Self::empty();
        }
        let total_posts = posts.len() as i64;
        let total_likes: i64 = posts.iter().map(|p| p.likes).sum();
        let total_reposts: i64 = posts.iter().map(|p| p.reposts).sum();
        let total_replies: i64 = posts.iter().map(|p| p.replies).sum();
        let most_popular = posts.iter().max_by_key(|p| p.engagement()).cloned();
        let last_posted_at = posts.iter().map(|p| p.posted_at.clone()).max();
        Self {
            total_posts,
            total_likes,
            total_reposts,
            total_replies,
            average_engagement: (total_likes + total_reposts + total_replies) as f64
                / total_posts as f64,
            most_popular,
            last_posted_at,
        }
    }
}
