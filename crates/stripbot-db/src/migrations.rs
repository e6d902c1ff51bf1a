//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order.  A
//! `schema_migrations` table tracks which versions have been applied.

use rusqlite::Connection;
use stripbot_core::{Error, Result};

/// V1: initial schema -- comics keyed by strip date, posts referencing them.
const V1_INITIAL: &str = r#"
CREATE TABLE comics (
    strip_date   TEXT PRIMARY KEY,
    image_url    TEXT NOT NULL,
    title        TEXT,
    storage_path TEXT NOT NULL,
    posted       INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE posts (
    id          TEXT PRIMARY KEY,
    strip_date  TEXT NOT NULL REFERENCES comics(strip_date),
    bluesky_uri TEXT NOT NULL,
    bluesky_cid TEXT NOT NULL,
    post_text   TEXT NOT NULL,
    posted_at   TEXT NOT NULL
);

CREATE INDEX idx_comics_posted    ON comics(posted);
CREATE INDEX idx_posts_strip_date ON posts(strip_date);
"#;

/// V2: engagement counters on posts.
const V2_ENGAGEMENT: &str = r#"
ALTER TABLE posts ADD COLUMN likes   INTEGER NOT NULL DEFAULT 0;
ALTER TABLE posts ADD COLUMN reposts INTEGER NOT NULL DEFAULT 0;
ALTER TABLE posts ADD COLUMN replies INTEGER NOT NULL DEFAULT 0;
"#;

/// Ordered list of (version, sql) pairs.
const MIGRATIONS: &[(i64, &str)] = &[(1, V1_INITIAL), (2, V2_ENGAGEMENT)];

/// Run all pending migrations on `conn`.
///
/// Creates the `schema_migrations` tracking table if it does not exist,
/// then applies each outstanding migration inside a transaction.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))?;

    for &(version, sql) in MIGRATIONS {
        let already: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;

        if already {
            continue;
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        tx.execute_batch(sql)
            .map_err(|e| Error::database(format!("Migration V{version} failed: {e}")))?;

        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [version],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        tx.commit().map_err(|e| Error::database(e.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        // second call is a no-op
        run_migrations(&conn).unwrap();
    }

    #[test]
    fn test_all_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();

        for t in ["comics", "posts", "schema_migrations"] {
            let exists: bool = conn
                .query_row(
                    "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
                    [t],
                    |row| row.get(0),
                )
                .unwrap();
            assert!(exists, "table {t} should exist");
        }
    }

    #[test]
    fn test_engagement_columns_present() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        // the V2 columns are selectable
        conn.query_row("SELECT likes, reposts, replies FROM posts LIMIT 1", [], |_| Ok(()))
            .ok();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('posts') WHERE name IN ('likes','reposts','replies')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }
}
