//! The record-store seam.
//!
//! [`RecordStore`] is the one trait the API, scheduler, and serverless entry
//! points talk to. Two backends implement it: [`SqliteStore`] (relational,
//! default) and [`crate::kv::SledStore`] (key-value).

use chrono::NaiveDate;
use stripbot_core::{PostId, Result};

use crate::models::{Comic, ComicCounts, EngagementUpdate, NewComic, NewPost, Post, PostStats};
use crate::pool::{self, DbPool};
use crate::queries;

/// Persistence operations over comics and posts.
pub trait RecordStore: Send + Sync {
    /// Short backend name for status reporting ("sqlite", "sled").
    fn backend_name(&self) -> &'static str;

    /// Insert a comic; a duplicate strip date returns the existing record.
    fn insert_comic(&self, new: &NewComic) -> Result<Comic>;
    fn get_comic(&self, date: NaiveDate) -> Result<Option<Comic>>;
    fn list_comics(&self, posted: Option<bool>, offset: i64, limit: i64) -> Result<Vec<Comic>>;
    /// Every unposted comic, oldest first.
    fn list_unposted(&self) -> Result<Vec<Comic>>;
    /// Returns false when the date is unknown.
    fn mark_posted(&self, date: NaiveDate) -> Result<bool>;
    fn comic_counts(&self) -> Result<ComicCounts>;

    fn record_post(&self, new: &NewPost) -> Result<Post>;
    fn get_post(&self, id: PostId) -> Result<Option<Post>>;
    fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<Post>>;
    /// Partial update; `None` when the ID is unknown.
    fn update_engagement(&self, id: PostId, update: &EngagementUpdate) -> Result<Option<Post>>;
    fn delete_post(&self, id: PostId) -> Result<bool>;
    fn post_stats(&self) -> Result<PostStats>;
}

/// SQLite-backed record store over an r2d2 pool.
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and run migrations.
    pub fn open(db_path: &str) -> Result<Self> {
        Ok(Self {
            pool: pool::init_pool(db_path)?,
        })
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            pool: pool::init_memory_pool()?,
        })
    }
}

impl RecordStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn insert_comic(&self, new: &NewComic) -> Result<Comic> {
        let conn = pool::get_conn(&self.pool)?;
        queries::comics::insert_comic(&conn, new)
    }

    fn get_comic(&self, date: NaiveDate) -> Result<Option<Comic>> {
        let conn = pool::get_conn(&self.pool)?;
        queries::comics::get_comic(&conn, date)
    }

    fn list_comics(&self, posted: Option<bool>, offset: i64, limit: i64) -> Result<Vec<Comic>> {
        let conn = pool::get_conn(&self.pool)?;
        queries::comics::list_comics(&conn, posted, offset, limit)
    }

    fn list_unposted(&self) -> Result<Vec<Comic>> {
        let conn = pool::get_conn(&self.pool)?;
        queries::comics::list_unposted(&conn)
    }

    fn mark_posted(&self, date: NaiveDate) -> Result<bool> {
        let conn = pool::get_conn(&self.pool)?;
        queries::comics::mark_posted(&conn, date)
    }

    fn comic_counts(&self) -> Result<ComicCounts> {
        let conn = pool::get_conn(&self.pool)?;
        queries::comics::comic_counts(&conn)
    }

    fn record_post(&self, new: &NewPost) -> Result<Post> {
        let conn = pool::get_conn(&self.pool)?;
        queries::posts::record_post(&conn, new)
    }

    fn get_post(&self, id: PostId) -> Result<Option<Post>> {
        let conn = pool::get_conn(&self.pool)?;
        queries::posts::get_post(&conn, id)
    }

    fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<Post>> {
        let conn = pool::get_conn(&self.pool)?;
        queries::posts::list_posts(&conn, offset, limit)
    }

    fn update_engagement(&self, id: PostId, update: &EngagementUpdate) -> Result<Option<Post>> {
        let conn = pool::get_conn(&self.pool)?;
        queries::posts::update_engagement(&conn, id, update)
    }

    fn delete_post(&self, id: PostId) -> Result<bool> {
        let conn = pool::get_conn(&self.pool)?;
        queries::posts::delete_post(&conn, id)
    }

    fn post_stats(&self) -> Result<PostStats> {
        let conn = pool::get_conn(&self.pool)?;
        queries::posts::post_stats(&conn)
    }
}
