//! Key-value record store backed by sled.
//!
//! Two trees: `comics` keyed by the `YYYY-MM-DD` strip date, `posts` keyed by
//! the post UUID. Values are JSON-encoded models, so the sled and SQLite
//! backends stay interchangeable behind [`RecordStore`].

use chrono::{NaiveDate, Utc};
use std::path::Path;
use stripbot_core::{Error, PostId, Result};

use crate::models::{Comic, ComicCounts, EngagementUpdate, NewComic, NewPost, Post, PostStats};
use crate::store::RecordStore;

/// Sled-backed record store.
pub struct SledStore {
    comics: sled::Tree,
    posts: sled::Tree,
    // Keeps the database open for the lifetime of the store.
    _db: sled::Db,
}

fn db_err(e: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::database(Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(db_err)
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(db_err)
}

impl SledStore {
    /// Open (or create) the sled database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let db = sled::open(path).map_err(db_err)?;
        let comics = db.open_tree("comics").map_err(db_err)?;
        let posts = db.open_tree("posts").map_err(db_err)?;
        Ok(Self {
            comics,
            posts,
            _db: db,
        })
    }

    /// Temporary store for tests.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open().map_err(db_err)?;
        let comics = db.open_tree("comics").map_err(db_err)?;
        let posts = db.open_tree("posts").map_err(db_err)?;
        Ok(Self {
            comics,
            posts,
            _db: db,
        })
    }

    fn all_comics(&self) -> Result<Vec<Comic>> {
        // Date keys sort lexicographically in chronological order.
        let mut out = Vec::new();
        for entry in self.comics.iter() {
            let (_, value) = entry.map_err(db_err)?;
            out.push(decode::<Comic>(&value)?);
        }
        Ok(out)
    }

    fn all_posts(&self) -> Result<Vec<Post>> {
        let mut out = Vec::new();
        for entry in self.posts.iter() {
            let (_, value) = entry.map_err(db_err)?;
            out.push(decode::<Post>(&value)?);
        }
        Ok(out)
    }
}

impl RecordStore for SledStore {
    fn backend_name(&self) -> &'static str {
        "sled"
    }

    fn insert_comic(&self, new: &NewComic) -> Result<Comic> {
        let key = date_key(new.strip_date);
        let now = Utc::now().to_rfc3339();
        let comic = Comic {
            strip_date: new.strip_date,
            image_url: new.image_url.clone(),
            title: new.title.clone(),
            storage_path: new.storage_path.clone(),
            posted: false,
            created_at: now.clone(),
            updated_at: now,
        };

        // Only the first writer for a date wins; later inserts see the
        // existing record.
        match self
            .comics
            .compare_and_swap(key.as_bytes(), None::<&[u8]>, Some(encode(&comic)?))
            .map_err(db_err)?
        {
            Ok(()) => Ok(comic),
            Err(cas) => match cas.current {
                Some(existing) => decode(&existing),
                None => Err(Error::Internal(format!("comic {key} missing after insert"))),
            },
        }
    }

    fn get_comic(&self, date: NaiveDate) -> Result<Option<Comic>> {
        match self.comics.get(date_key(date)).map_err(db_err)? {
            Some(value) => Ok(Some(decode(&value)?)),
            None => Ok(None),
        }
    }

    fn list_comics(&self, posted: Option<bool>, offset: i64, limit: i64) -> Result<Vec<Comic>> {
        let mut comics = self.all_comics()?;
        comics.reverse(); // newest first
        Ok(comics
            .into_iter()
            .filter(|c| posted.map_or(true, |p| c.posted == p))
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    fn list_unposted(&self) -> Result<Vec<Comic>> {
        Ok(self
            .all_comics()?
            .into_iter()
            .filter(|c| !c.posted)
            .collect())
    }

    fn mark_posted(&self, date: NaiveDate) -> Result<bool> {
        let key = date_key(date);
        let Some(value) = self.comics.get(&key).map_err(db_err)? else {
            return Ok(false);
        };
        let mut comic: Comic = decode(&value)?;
        comic.posted = true;
        comic.updated_at = Utc::now().to_rfc3339();
        self.comics
            .insert(key.as_bytes(), encode(&comic)?)
            .map_err(db_err)?;
        Ok(true)
    }

    fn comic_counts(&self) -> Result<ComicCounts> {
        let comics = self.all_comics()?;
        let posted = comics.iter().filter(|c| c.posted).count() as i64;
        Ok(ComicCounts {
            total: comics.len() as i64,
            posted,
        })
    }

    fn record_post(&self, new: &NewPost) -> Result<Post> {
        let post = Post {
            id: PostId::new(),
            strip_date: new.strip_date,
            bluesky_uri: new.bluesky_uri.clone(),
            bluesky_cid: new.bluesky_cid.clone(),
            post_text: new.post_text.clone(),
            posted_at: Utc::now().to_rfc3339(),
            likes: 0,
            reposts: 0,
            replies: 0,
        };
        self.posts
            .insert(post.id.to_string().as_bytes(), encode(&post)?)
            .map_err(db_err)?;
        Ok(post)
    }

    fn get_post(&self, id: PostId) -> Result<Option<Post>> {
        match self.posts.get(id.to_string()).map_err(db_err)? {
            Some(value) => Ok(Some(decode(&value)?)),
            None => Ok(None),
        }
    }

    fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<Post>> {
        let mut posts = self.all_posts()?;
        posts.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        Ok(posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    fn update_engagement(&self, id: PostId, update: &EngagementUpdate) -> Result<Option<Post>> {
        let key = id.to_string();
        let Some(value) = self.posts.get(&key).map_err(db_err)? else {
            return Ok(None);
        };
        let mut post: Post = decode(&value)?;
        if let Some(ref text) = update.post_text {
            post.post_text = text.clone();
        }
        if let Some(likes) = update.likes {
            post.likes = likes.max(0);
        }
        if let Some(reposts) = update.reposts {
            post.reposts = reposts.max(0);
        }
        if let Some(replies) = update.replies {
            post.replies = replies.max(0);
        }
        self.posts
            .insert(key.as_bytes(), encode(&post)?)
            .map_err(db_err)?;
        Ok(Some(post))
    }

    fn delete_post(&self, id: PostId) -> Result<bool> {
        Ok(self
            .posts
            .remove(id.to_string())
            .map_err(db_err)?
            .is_some())
    }

    fn post_stats(&self) -> Result<PostStats> {
        Ok(PostStats::from_posts(&self.all_posts()?))
    }
}
