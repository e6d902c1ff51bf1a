//! Service-oriented application context.
//!
//! [`AppContext`] is the central struct shared across all route handlers via
//! Axum state and by the background scheduler. Everything in it is an `Arc`,
//! so cloning is cheap.

use std::sync::Arc;

use stripbot_core::config::Config;
use stripbot_db::RecordStore;

use crate::bluesky::BlueskyClient;
use crate::fetch::StripFetcher;
use crate::storage::ImageStore;

/// Application context shared by all request handlers (via Axum state).
#[derive(Clone)]
pub struct AppContext {
    /// Record store (sqlite or sled, per config).
    pub records: Arc<dyn RecordStore>,
    /// Image storage (local disk or S3, per config).
    pub images: Arc<dyn ImageStore>,
    /// Bluesky XRPC client with cached session.
    pub bluesky: Arc<BlueskyClient>,
    /// Comic page scraper and image downloader.
    pub fetcher: Arc<StripFetcher>,
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
}
