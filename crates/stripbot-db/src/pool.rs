//! SQLite connection pooling.
//!
//! The write load here is tiny (one strip per fetch, one post per scheduler
//! tick) but the scheduler task and the API handlers share one database
//! file, so connections come from a small r2d2 pool with WAL enabled for
//! concurrent readers.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use stripbot_core::{Error, Result};

use crate::migrations;

/// Scheduler plus a few concurrent API requests; SQLite has a single writer
/// anyway, so a larger pool buys nothing.
const POOL_SIZE: u32 = 3;

/// How long a connection waits on the write lock before giving up.
const BUSY_TIMEOUT_MS: u32 = 5_000;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Open (or create) the database file and run pending migrations.
///
/// Every connection enables foreign keys (posts reference comics by strip
/// date) and a busy timeout so an API request blocks briefly instead of
/// failing while the scheduler holds the write lock.
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};",
        ))
    });
    build_pool(manager)
}

/// Pool over a private in-memory database, for tests.
///
/// Each call gets its own shared-cache URI: connections inside one pool see
/// the same comics and posts, while pools in concurrently running tests stay
/// isolated from each other.
pub fn init_memory_pool() -> Result<DbPool> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT_DB: AtomicU64 = AtomicU64::new(0);
    let uri = format!(
        "file:stripbot_mem_{}?mode=memory&cache=shared",
        NEXT_DB.fetch_add(1, Ordering::Relaxed)
    );

    let manager = SqliteConnectionManager::file(uri)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    build_pool(manager)
}

fn build_pool(manager: SqliteConnectionManager) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .map_err(|e| Error::database(format!("connection pool: {e}")))?;

    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("migration connection: {e}")))?;
    migrations::run_migrations(&conn)?;

    Ok(pool)
}

/// Check out a connection.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("pool checkout: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_ready_after_init() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type='table' AND name IN ('comics', 'posts')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn orphan_post_is_rejected() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        // posts.strip_date references comics; no comic for this date exists
        let result = conn.execute(
            "INSERT INTO posts (id, strip_date, bluesky_uri, bluesky_cid, post_text, posted_at)
             VALUES ('p1', '2024-01-15', 'at://x', 'cid', 'text', '2024-01-15T12:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn pool_connections_share_the_database() {
        let pool = init_memory_pool().unwrap();

        let writer = get_conn(&pool).unwrap();
        writer
            .execute(
                "INSERT INTO comics (strip_date, image_url, storage_path, created_at, updated_at)
                 VALUES ('2024-01-15', 'https://example.com/s.png', 's.png', 'now', 'now')",
                [],
            )
            .unwrap();

        let reader = get_conn(&pool).unwrap();
        let count: i64 = reader
            .query_row("SELECT COUNT(*) FROM comics", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn memory_pools_are_isolated() {
        let a = init_memory_pool().unwrap();
        let b = init_memory_pool().unwrap();

        get_conn(&a)
            .unwrap()
            .execute(
                "INSERT INTO comics (strip_date, image_url, storage_path, created_at, updated_at)
                 VALUES ('2024-01-15', 'https://example.com/s.png', 's.png', 'now', 'now')",
                [],
            )
            .unwrap();

        let count: i64 = get_conn(&b)
            .unwrap()
            .query_row("SELECT COUNT(*) FROM comics", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
