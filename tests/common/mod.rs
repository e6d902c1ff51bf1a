//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory record store, a
//! temp-dir image store, default config, and full [`AppContext`]. The
//! [`with_server`] constructor starts Axum on a random port for HTTP-level
//! testing; [`with_server_config`] takes a custom config so tests can point
//! the Bluesky client and strip fetcher at a wiremock server.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use stripbot_core::Config;
use stripbot_db::models::{NewComic, NewPost, Post};
use stripbot_db::{RecordStore, SqliteStore};
use stripbot_server::bluesky::BlueskyClient;
use stripbot_server::context::AppContext;
use stripbot_server::fetch::StripFetcher;
use stripbot_server::router::build_router;
use stripbot_server::storage::{ImageStore, LocalImageStore};

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a temporary image directory.
pub struct TestHarness {
    pub ctx: AppContext,
    _image_dir: TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let records: Arc<dyn RecordStore> =
            Arc::new(SqliteStore::in_memory().expect("failed to create in-memory store"));

        let image_dir = TempDir::new().expect("failed to create temp image dir");
        let images: Arc<dyn ImageStore> =
            Arc::new(LocalImageStore::new(image_dir.path().to_path_buf()));

        let bluesky = Arc::new(BlueskyClient::new(&config.bluesky));
        let fetcher = Arc::new(StripFetcher::new(&config.comic));

        let ctx = AppContext {
            records,
            images,
            bluesky,
            fetcher,
            config: Arc::new(config),
        };

        Self {
            ctx,
            _image_dir: image_dir,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Insert a comic record, optionally marked as already posted.
    pub fn seed_comic(&self, date: &str, posted: bool) -> NaiveDate {
        let strip_date = NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("bad test date");
        self.ctx
            .records
            .insert_comic(&NewComic {
                strip_date,
                image_url: format!("https://assets.example.com/{date}.png"),
                title: Some(format!("Strip for {date}")),
                storage_path: format!("test_{date}.png"),
            })
            .expect("failed to seed comic");
        if posted {
            self.ctx
                .records
                .mark_posted(strip_date)
                .expect("failed to mark posted");
        }
        strip_date
    }

    /// Insert a comic with its image bytes available in storage.
    pub async fn seed_comic_with_image(&self, date: &str) -> NaiveDate {
        let strip_date = self.seed_comic(date, false);
        self.ctx
            .images
            .put(&format!("test_{date}.png"), b"fake png bytes")
            .await
            .expect("failed to store test image");
        strip_date
    }

    /// Insert a post record for a comic date (seeding the comic first).
    pub fn seed_post(&self, date: &str) -> Post {
        let strip_date = self.seed_comic(date, true);
        self.ctx
            .records
            .record_post(&NewPost {
                strip_date,
                bluesky_uri: format!("at://did:plc:test/app.bsky.feed.post/{date}"),
                bluesky_cid: format!("cid-{date}"),
                post_text: "test post".into(),
            })
            .expect("failed to seed post")
    }
}
