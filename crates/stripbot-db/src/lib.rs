//! stripbot-db: record store backends.
//!
//! This crate provides the [`store::RecordStore`] trait over comic and post
//! records, with a SQLite backend (connection pooling, embedded migrations,
//! typed models, query modules) and a sled key-value backend.

pub mod kv;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod store;

pub use kv::SledStore;
pub use models::{Comic, ComicCounts, EngagementUpdate, NewComic, NewPost, Post, PostStats};
pub use store::{RecordStore, SqliteStore};
