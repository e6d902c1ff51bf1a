//! Post table operations.

use chrono::Utc;
use rusqlite::Connection;
use stripbot_core::{Error, PostId, Result};

use crate::models::{EngagementUpdate, NewPost, Post, PostStats};

const COLS: &str = "id, strip_date, bluesky_uri, bluesky_cid, post_text, posted_at,
    likes, reposts, replies";

/// Record a published post.
pub fn record_post(conn: &Connection, new: &NewPost) -> Result<Post> {
    let id = PostId::new();
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO posts (id, strip_date, bluesky_uri, bluesky_cid, post_text, posted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            id.to_string(),
            new.strip_date.format("%Y-%m-%d").to_string(),
            new.bluesky_uri,
            new.bluesky_cid,
            new.post_text,
            &now
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Post {
        id,
        strip_date: new.strip_date,
        bluesky_uri: new.bluesky_uri.clone(),
        bluesky_cid: new.bluesky_cid.clone(),
        post_text: new.post_text.clone(),
        posted_at: now,
        likes: 0,
        reposts: 0,
        replies: 0,
    })
}

/// Get a post by ID.
pub fn get_post(conn: &Connection, id: PostId) -> Result<Option<Post>> {
    let q = format!("SELECT {COLS} FROM posts WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], Post::from_row);
    match result {
        Ok(p) => Ok(Some(p)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List posts with pagination, newest first.
pub fn list_posts(conn: &Connection, offset: i64, limit: i64) -> Result<Vec<Post>> {
    let q = format!("SELECT {COLS} FROM posts ORDER BY posted_at DESC LIMIT ?1 OFFSET ?2");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map(rusqlite::params![limit, offset], Post::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Apply a partial engagement update; unset fields are left untouched.
/// Counters are clamped at zero. Returns the updated post, or `None` when
/// the ID is unknown.
pub fn update_engagement(
    conn: &Connection,
    id: PostId,
    update: &EngagementUpdate,
) -> Result<Option<Post>> {
    conn.execute(
        "UPDATE posts SET
            post_text = COALESCE(?1, post_text),
            likes     = MAX(COALESCE(?2, likes), 0),
            reposts   = MAX(COALESCE(?3, reposts), 0),
            replies   = MAX(COALESCE(?4, replies), 0)
         WHERE id = ?5",
        rusqlite::params![
            update.post_text,
            update.likes,
            update.reposts,
            update.replies,
            id.to_string()
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    get_post(conn, id)
}

/// Delete a post. Returns false when the ID is unknown.
pub fn delete_post(conn: &Connection, id: PostId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM posts WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Aggregate engagement statistics across all posts.
pub fn post_stats(conn: &Connection) -> Result<PostStats> {
    let (total_posts, total_likes, total_reposts, total_replies, last_posted_at): (
        i64,
        i64,
        i64,
        i64,
        Option<String>,
    ) = conn
        .query_row(
            "SELECT COUNT(*), COALESCE(SUM(likes), 0), COALESCE(SUM(reposts), 0),
                    COALESCE(SUM(replies), 0), MAX(posted_at)
             FROM posts",
            [],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if total_posts == 0 {
        return Ok(PostStats::empty());
    }

    let q = format!(
        "SELECT {COLS} FROM posts ORDER BY likes + reposts + replies DESC, posted_at DESC LIMIT 1"
    );
    let most_popular = match conn.query_row(&q, [], Post::from_row) {
        Ok(p) => Some(p),
        Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(e) => return Err(Error::database(e.to_string())),
    };

    Ok(PostStats {
        total_posts,
        total_likes,
        total_reposts,
        total_replies,
        average_engagement: (total_likes + total_reposts + total_replies) as f64
            / total_posts as f64,
        most_popular,
        last_posted_at,
    })
}
