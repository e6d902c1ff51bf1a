//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the server, Bluesky account, comic source, storage, record
//! store, and scheduler. Every section defaults sensibly so a completely
//! empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

/// Environment variable that overrides `bluesky.password`.
pub const BLUESKY_PASSWORD_ENV: &str = "STRIPBOT_BLUESKY_PASSWORD";

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub bluesky: BlueskyConfig,
    pub comic: ComicConfig,
    pub storage: StorageConfig,
    pub records: RecordsConfig,
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    ///
    /// This is intentionally string-based so the caller can read the file
    /// however it sees fit (async, embedded, etc.).
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist. The Bluesky app password
    /// may be supplied via `STRIPBOT_BLUESKY_PASSWORD` instead of the file.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default().with_env_overrides();
        };

        let cfg = match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        };
        cfg.with_env_overrides()
    }

    /// Apply environment overrides on top of whatever the file provided.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(password) = std::env::var(BLUESKY_PASSWORD_ENV) {
            if !password.is_empty() {
                self.bluesky.password = Some(password);
            }
        }
        self
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.bluesky.identifier.is_empty() {
            warnings.push("bluesky.identifier is empty; posting will fail".into());
        }
        if self.bluesky.password.is_none() {
            warnings.push(format!(
                "bluesky password is not set (config or {BLUESKY_PASSWORD_ENV}); posting will fail"
            ));
        }
        if !self.bluesky.api_url.starts_with("http") {
            warnings.push(format!(
                "bluesky.api_url '{}' does not look like a URL",
                self.bluesky.api_url
            ));
        }

        if self.comic.slug.is_empty() {
            warnings.push("comic.slug is empty".into());
        }
        if self.comic.days_back == 0 {
            warnings.push("comic.days_back is 0; fetch will never find anything".into());
        }

        match self.storage.backend {
            StorageBackend::Local => {}
            StorageBackend::S3 => {
                if self.storage.bucket.is_empty() {
                    warnings.push("storage.backend is s3 but storage.bucket is empty".into());
                }
            }
        }

        if self.scheduler.post_interval_secs == 0 {
            warnings.push("scheduler.post_interval_secs is 0; the loop will spin".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            db_path: PathBuf::from("./data/stripbot.db"),
        }
    }
}

/// Bluesky account and XRPC endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlueskyConfig {
    /// Handle or email used as the session identifier.
    pub identifier: String,
    /// App password. Prefer the environment variable over the config file.
    pub password: Option<String>,
    /// XRPC base URL, with trailing slash.
    pub api_url: String,
}

impl Default for BlueskyConfig {
    fn default() -> Self {
        Self {
            identifier: String::new(),
            password: None,
            api_url: "https://bsky.social/xrpc/".into(),
        }
    }
}

/// Which comic to scrape and how its pages are addressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComicConfig {
    /// Path segment identifying the strip on the comics site.
    pub slug: String,
    /// Site base URL, no trailing slash.
    pub page_base: String,
    /// Alt text attached to posted images.
    pub alt_text: String,
    /// How many days back the catch-up fetch walks.
    pub days_back: u32,
}

impl Default for ComicConfig {
    fn default() -> Self {
        Self {
            slug: "calvinandhobbes".into(),
            page_base: "https://www.gocomics.com".into(),
            alt_text: "Calvin and Hobbes comic strip".into(),
            days_back: 7,
        }
    }
}

/// Image storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    S3,
}

/// Image storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for the local backend.
    pub image_dir: PathBuf,
    /// Bucket for the s3 backend.
    pub bucket: String,
    pub region: String,
    /// Key prefix inside the bucket, no leading slash.
    pub prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            image_dir: PathBuf::from("./data/images"),
            bucket: String::new(),
            region: "us-east-1".into(),
            prefix: "comics".into(),
        }
    }
}

/// Record store backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordsBackend {
    Sqlite,
    Sled,
}

/// Record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    pub backend: RecordsBackend,
    /// Directory for the sled backend.
    pub sled_path: PathBuf,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            backend: RecordsBackend::Sqlite,
            sled_path: PathBuf::from("./data/stripbot.sled"),
        }
    }
}

/// Background scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Seconds between posting ticks. Twice a day by default.
    pub post_interval_secs: u64,
    /// Shorter sleep after a failed tick.
    pub error_backoff_secs: u64,
    /// Fetch new strips when the unposted buffer drops below this.
    pub fetch_when_buffer_below: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            post_interval_secs: 43_200,
            error_backoff_secs: 300,
            fetch_when_buffer_below: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.comic.slug, "calvinandhobbes");
        assert_eq!(cfg.bluesky.api_url, "https://bsky.social/xrpc/");
        assert_eq!(cfg.storage.backend, StorageBackend::Local);
        assert_eq!(cfg.records.backend, RecordsBackend::Sqlite);
        assert_eq!(cfg.scheduler.post_interval_secs, 43_200);
        assert_eq!(cfg.scheduler.error_backoff_secs, 300);
    }

    #[test]
    fn default_config_warns_about_missing_credentials() {
        let cfg = Config::default();
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("bluesky.identifier")));
        assert!(warnings.iter().any(|w| w.contains("password")));
    }

    #[test]
    fn configured_account_has_no_credential_warnings() {
        let mut cfg = Config::default();
        cfg.bluesky.identifier = "strips.example.com".into();
        cfg.bluesky.password = Some("app-password".into());
        let warnings = cfg.validate();
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn s3_backend_without_bucket_warns() {
        let mut cfg = Config::default();
        cfg.storage.backend = StorageBackend::S3;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("storage.bucket")));
    }

    #[test]
    fn parse_json_config() {
        let json = r#"{
            "server": {"port": 9090},
            "bluesky": {"identifier": "bot.example.com"},
            "records": {"backend": "sled"}
        }"#;
        let cfg = Config::from_json(json).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.bluesky.identifier, "bot.example.com");
        assert_eq!(cfg.records.backend, RecordsBackend::Sled);
    }

    #[test]
    fn parse_empty_json_uses_defaults() {
        let cfg = Config::from_json("{}").unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.comic.days_back, 7);
    }

    #[test]
    fn parse_storage_backend_names() {
        let cfg = Config::from_json(r#"{"storage": {"backend": "s3", "bucket": "b"}}"#).unwrap();
        assert_eq!(cfg.storage.backend, StorageBackend::S3);
        assert!(Config::from_json(r#"{"storage": {"backend": "ftp"}}"#).is_err());
    }

    #[test]
    fn load_or_default_with_none() {
        let cfg = Config::load_or_default(None);
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn load_or_default_with_missing_file() {
        let cfg = Config::load_or_default(Some(Path::new("/nonexistent/config.json")));
        assert_eq!(cfg.server.port, 8080);
    }
}
