//! Comic table operations.

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use stripbot_core::{Error, Result};

use crate::models::{Comic, ComicCounts, NewComic};

const COLS: &str = "strip_date, image_url, title, storage_path, posted, created_at, updated_at";

/// Insert a comic, returning the stored row.
///
/// The strip date is the primary key; inserting a date that already exists
/// is a no-op that returns the existing record unchanged.
pub fn insert_comic(conn: &Connection, new: &NewComic) -> Result<Comic> {
    let now = Utc::now().to_rfc3339();
    let date = new.strip_date.format("%Y-%m-%d").to_string();

    conn.execute(
        "INSERT OR IGNORE INTO comics (strip_date, image_url, title, storage_path, posted, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
        rusqlite::params![date, new.image_url, new.title, new.storage_path, &now],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    get_comic(conn, new.strip_date)?
        .ok_or_else(|| Error::Internal(format!("comic {date} missing after insert")))
}

/// Get a comic by strip date.
pub fn get_comic(conn: &Connection, date: NaiveDate) -> Result<Option<Comic>> {
    let q = format!("SELECT {COLS} FROM comics WHERE strip_date = ?1");
    let result = conn.query_row(&q, [date.format("%Y-%m-%d").to_string()], Comic::from_row);
    match result {
        Ok(c) => Ok(Some(c)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List comics with optional posted filter and pagination, newest first.
pub fn list_comics(
    conn: &Connection,
    posted: Option<bool>,
    offset: i64,
    limit: i64,
) -> Result<Vec<Comic>> {
    let (q, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = if let Some(p) = posted {
        (
            format!(
                "SELECT {COLS} FROM comics WHERE posted = ?1
                 ORDER BY strip_date DESC LIMIT ?2 OFFSET ?3"
            ),
            vec![Box::new(p as i64), Box::new(limit), Box::new(offset)],
        )
    } else {
        (
            format!(
                "SELECT {COLS} FROM comics
                 ORDER BY strip_date DESC LIMIT ?1 OFFSET ?2"
            ),
            vec![Box::new(limit), Box::new(offset)],
        )
    };

    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|b| b.as_ref()).collect();
    let rows = stmt
        .query_map(params_refs.as_slice(), Comic::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// List every unposted comic, oldest first.
pub fn list_unposted(conn: &Connection) -> Result<Vec<Comic>> {
    let q = format!("SELECT {COLS} FROM comics WHERE posted = 0 ORDER BY strip_date ASC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], Comic::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Flag a comic as posted. Returns false when the date is unknown.
pub fn mark_posted(conn: &Connection, date: NaiveDate) -> Result<bool> {
    let now = Utc::now().to_rfc3339();
    let n = conn
        .execute(
            "UPDATE comics SET posted = 1, updated_at = ?1 WHERE strip_date = ?2",
            rusqlite::params![now, date.format("%Y-%m-%d").to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Total and posted counts in one query.
pub fn comic_counts(conn: &Connection) -> Result<ComicCounts> {
    conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(posted), 0) FROM comics",
        [],
        |row| {
            Ok(ComicCounts {
                total: row.get(0)?,
                posted: row.get(1)?,
            })
        },
    )
    .map_err(|e| Error::database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    fn new_comic(date: NaiveDate) -> NewComic {
        NewComic {
            strip_date: date,
            image_url: "https://example.com/strip.png".into(),
            title: Some("Calvin and Hobbes".into()),
            storage_path: format!("comics/ch_{}.png", date.format("%Y%m%d")),
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn insert_and_get() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let comic = insert_comic(&conn, &new_comic(d(2024, 1, 15))).unwrap();
        assert!(!comic.posted);

        let found = get_comic(&conn, d(2024, 1, 15)).unwrap().unwrap();
        assert_eq!(found.title.as_deref(), Some("Calvin and Hobbes"));
        assert!(get_comic(&conn, d(2024, 1, 16)).unwrap().is_none());
    }

    #[test]
    fn duplicate_date_keeps_original() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let first = insert_comic(&conn, &new_comic(d(2024, 1, 15))).unwrap();

        let mut dup = new_comic(d(2024, 1, 15));
        dup.title = Some("Different title".into());
        let second = insert_comic(&conn, &dup).unwrap();

        assert_eq!(second.title, first.title);
        assert_eq!(comic_counts(&conn).unwrap().total, 1);
    }

    #[test]
    fn list_with_posted_filter() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        insert_comic(&conn, &new_comic(d(2024, 1, 14))).unwrap();
        insert_comic(&conn, &new_comic(d(2024, 1, 15))).unwrap();
        mark_posted(&conn, d(2024, 1, 14)).unwrap();

        let all = list_comics(&conn, None, 0, 100).unwrap();
        assert_eq!(all.len(), 2);
        // newest first
        assert_eq!(all[0].strip_date, d(2024, 1, 15));

        let posted = list_comics(&conn, Some(true), 0, 100).unwrap();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].strip_date, d(2024, 1, 14));

        let unposted = list_unposted(&conn).unwrap();
        assert_eq!(unposted.len(), 1);
        assert_eq!(unposted[0].strip_date, d(2024, 1, 15));
    }

    #[test]
    fn mark_posted_unknown_date() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        assert!(!mark_posted(&conn, d(2024, 1, 1)).unwrap());
    }

    #[test]
    fn counts() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let counts = comic_counts(&conn).unwrap();
        assert_eq!(counts.total, 0);
        assert_eq!(counts.unposted(), 0);

        insert_comic(&conn, &new_comic(d(2024, 1, 14))).unwrap();
        insert_comic(&conn, &new_comic(d(2024, 1, 15))).unwrap();
        mark_posted(&conn, d(2024, 1, 14)).unwrap();

        let counts = comic_counts(&conn).unwrap();
        assert_eq!(counts.total, 2);
        assert_eq!(counts.posted, 1);
        assert_eq!(counts.unposted(), 1);
    }

    #[test]
    fn pagination() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        for day in 1..=10 {
            insert_comic(&conn, &new_comic(d(2024, 1, day))).unwrap();
        }
        let page = list_comics(&conn, None, 3, 3).unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].strip_date, d(2024, 1, 7));
    }
}
