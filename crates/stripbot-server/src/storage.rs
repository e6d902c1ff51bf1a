//! Image storage backends.
//!
//! [`ImageStore`] hides where strip images live. The local backend keeps
//! files under a directory and uses relative paths; the S3 backend stores
//! `s3://bucket/key` paths and hands out presigned GET URLs.

use async_trait::async_trait;
use std::path::PathBuf;

use rusoto_core::credential::{ChainProvider, ProvideAwsCredentials};
use rusoto_core::Region;
use rusoto_s3::util::{PreSignedRequest, PreSignedRequestOption};
use rusoto_s3::{
    DeleteObjectRequest, GetObjectRequest, HeadObjectRequest, PutObjectRequest, S3Client, S3,
};
use stripbot_core::{config::StorageConfig, Error, Result};

/// Default lifetime of presigned URLs.
const PRESIGN_EXPIRES_SECS: u64 = 3600;

/// Guess a MIME type from a file name's extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Storage seam for strip images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Short backend name for status reporting ("local", "s3").
    fn backend_name(&self) -> &'static str;

    /// Store `bytes` under `file_name`; returns the permanent storage path
    /// to record alongside the comic.
    async fn put(&self, file_name: &str, bytes: &[u8]) -> Result<String>;

    /// Load the raw bytes for a previously stored path.
    async fn get(&self, storage_path: &str) -> Result<Vec<u8>>;

    /// Delete a stored image. Returns false when it was already gone.
    async fn delete(&self, storage_path: &str) -> Result<bool>;

    /// Turn a storage path into something a browser can fetch.
    async fn resolve_url(&self, storage_path: &str) -> Result<String>;

    /// Backend reachability for the system-status endpoint.
    async fn healthy(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Local disk
// ---------------------------------------------------------------------------

/// Stores images under a configured directory; storage paths are file names
/// relative to it.
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn full_path(&self, storage_path: &str) -> PathBuf {
        self.root.join(storage_path)
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn put(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        let path = self.full_path(file_name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "Stored image locally");
        Ok(file_name.to_string())
    }

    async fn get(&self, storage_path: &str) -> Result<Vec<u8>> {
        let path = self.full_path(storage_path);
        tokio::fs::read(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::not_found("image", storage_path),
                _ => Error::Io { source: e },
            })
    }

    async fn delete(&self, storage_path: &str) -> Result<bool> {
        match tokio::fs::remove_file(self.full_path(storage_path)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io { source: e }),
        }
    }

    async fn resolve_url(&self, storage_path: &str) -> Result<String> {
        Ok(storage_path.to_string())
    }

    async fn healthy(&self) -> bool {
        tokio::fs::create_dir_all(&self.root).await.is_ok()
    }
}

// ---------------------------------------------------------------------------
// S3
// ---------------------------------------------------------------------------

/// Stores images in an S3 bucket; storage paths are `s3://bucket/key` URIs.
pub struct S3ImageStore {
    client: S3Client,
    region: Region,
    bucket: String,
    prefix: String,
}

impl S3ImageStore {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let region: Region = config
            .region
            .parse()
            .map_err(|e| Error::Validation(format!("invalid storage.region: {e}")))?;
        Ok(Self {
            client: S3Client::new(region.clone()),
            region,
            bucket: config.bucket.clone(),
            prefix: config.prefix.trim_matches('/').to_string(),
        })
    }

    fn object_key(&self, storage_path: &str) -> String {
        // Accepts either a bare key or an s3://bucket/key URI.
        match storage_path
            .strip_prefix("s3://")
            .and_then(|rest| rest.split_once('/'))
        {
            Some((_bucket, key)) => key.to_string(),
            None => storage_path.to_string(),
        }
    }

    async fn head(&self, key: &str) -> bool {
        self.client
            .head_object(HeadObjectRequest {
                bucket: self.bucket.clone(),
                key: key.to_string(),
                ..Default::default()
            })
            .await
            .is_ok()
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    fn backend_name(&self) -> &'static str {
        "s3"
    }

    async fn put(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        let key = if self.prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.prefix, file_name)
        };

        self.client
            .put_object(PutObjectRequest {
                bucket: self.bucket.clone(),
                key: key.clone(),
                body: Some(bytes.to_vec().into()),
                content_type: Some(content_type_for(file_name).to_string()),
                cache_control: Some("max-age=31536000".to_string()),
                ..Default::default()
            })
            .await
            .map_err(|e| Error::http("s3", format!("put_object {key}: {e}")))?;

        // Read-after-write check before recording the path.
        if !self.head(&key).await {
            return Err(Error::http("s3", format!("upload verification failed for {key}")));
        }

        tracing::debug!(bucket = %self.bucket, key = %key, size = bytes.len(), "Stored image in S3");
        Ok(format!("s3://{}/{key}", self.bucket))
    }

    async fn get(&self, storage_path: &str) -> Result<Vec<u8>> {
        let key = self.object_key(storage_path);
        let output = self
            .client
            .get_object(GetObjectRequest {
                bucket: self.bucket.clone(),
                key: key.clone(),
                ..Default::default()
            })
            .await
            .map_err(|e| Error::http("s3", format!("get_object {key}: {e}")))?;

        let body = output
            .body
            .ok_or_else(|| Error::http("s3", format!("empty body for {key}")))?;

        use tokio::io::AsyncReadExt;
        let mut buf = Vec::new();
        body.into_async_read()
            .read_to_end(&mut buf)
            .await
            .map_err(|e| Error::http("s3", format!("read body {key}: {e}")))?;
        Ok(buf)
    }

    async fn delete(&self, storage_path: &str) -> Result<bool> {
        let key = self.object_key(storage_path);
        let existed = self.head(&key).await;

        self.client
            .delete_object(DeleteObjectRequest {
                bucket: self.bucket.clone(),
                key: key.clone(),
                ..Default::default()
            })
            .await
            .map_err(|e| Error::http("s3", format!("delete_object {key}: {e}")))?;

        if self.head(&key).await {
            return Err(Error::http("s3", format!("{key} still exists after delete")));
        }
        Ok(existed)
    }

    async fn resolve_url(&self, storage_path: &str) -> Result<String> {
        let key = self.object_key(storage_path);
        if !self.head(&key).await {
            return Err(Error::not_found("image", storage_path));
        }

        let credentials = ChainProvider::new()
            .credentials()
            .await
            .map_err(|e| Error::http("s3", format!("credentials: {e}")))?;

        let request = GetObjectRequest {
            bucket: self.bucket.clone(),
            key,
            ..Default::default()
        };
        Ok(request.get_presigned_url(
            &self.region,
            &credentials,
            &PreSignedRequestOption {
                expires_in: std::time::Duration::from_secs(PRESIGN_EXPIRES_SECS),
            },
        ))
    }

    async fn healthy(&self) -> bool {
        self.client
            .head_object(HeadObjectRequest {
                bucket: self.bucket.clone(),
                key: "__health__".to_string(),
                ..Default::default()
            })
            .await
            .map_or_else(|e| !matches!(e, rusoto_core::RusotoError::HttpDispatch(_)), |_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("calvin_20240115.png"), "image/png");
        assert_eq!(content_type_for("strip.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("strip.jpg"), "image/jpeg");
        assert_eq!(content_type_for("mystery"), "application/octet-stream");
    }

    #[test]
    fn s3_key_extraction() {
        let store = S3ImageStore::new(&StorageConfig {
            backend: stripbot_core::config::StorageBackend::S3,
            image_dir: PathBuf::new(),
            bucket: "strips".into(),
            region: "us-east-1".into(),
            prefix: "comics".into(),
        })
        .unwrap();

        assert_eq!(
            store.object_key("s3://strips/comics/calvin_20240115.png"),
            "comics/calvin_20240115.png"
        );
        assert_eq!(store.object_key("comics/x.png"), "comics/x.png");
    }

    #[tokio::test]
    async fn local_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path().to_path_buf());

        let path = store.put("calvin_20240115.png", b"strip bytes").await.unwrap();
        assert_eq!(path, "calvin_20240115.png");

        let bytes = store.get(&path).await.unwrap();
        assert_eq!(bytes, b"strip bytes");

        assert_eq!(store.resolve_url(&path).await.unwrap(), path);
        assert!(store.healthy().await);

        assert!(store.delete(&path).await.unwrap());
        assert!(!store.delete(&path).await.unwrap());
    }

    #[tokio::test]
    async fn local_get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path().to_path_buf());
        let err = store.get("nope.png").await.unwrap_err();
        assert_eq!(err.http_status(), 404);
    }
}
