//! Bluesky ATProto XRPC client.
//!
//! Speaks the three XRPC methods the bot needs: `createSession` for login,
//! `uploadBlob` for the strip image, and `createRecord` to publish the post.
//! The session (access JWT + account DID) is cached; a 401 on an
//! authenticated call drops the cache and retries once.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use stripbot_core::{config::BlueskyConfig, Error, Result};

const POST_COLLECTION: &str = "app.bsky.feed.post";

/// Cached login state.
#[derive(Debug, Clone, Deserialize)]
pub struct BlueskySession {
    #[serde(rename = "accessJwt")]
    pub access_jwt: String,
    /// Account DID; used as the `repo` when creating records.
    pub did: String,
}

/// Reference to a created record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRef {
    pub uri: String,
    pub cid: String,
}

/// Image attachment for a post.
pub struct PostImage<'a> {
    pub bytes: &'a [u8],
    pub content_type: &'a str,
    pub alt: &'a str,
}

pub struct BlueskyClient {
    http: reqwest::Client,
    api_url: String,
    identifier: String,
    password: Option<String>,
    session: RwLock<Option<BlueskySession>>,
}

impl BlueskyClient {
    pub fn new(config: &BlueskyConfig) -> Self {
        let mut api_url = config.api_url.clone();
        if !api_url.ends_with('/') {
            api_url.push('/');
        }
        Self {
            http: reqwest::Client::new(),
            api_url,
            identifier: config.identifier.clone(),
            password: config.password.clone(),
            session: RwLock::new(None),
        }
    }

    fn xrpc_url(&self, method: &str) -> String {
        format!("{}{method}", self.api_url)
    }

    /// Log in and cache the session.
    pub async fn create_session(&self) -> Result<BlueskySession> {
        let password = self
            .password
            .as_deref()
            .ok_or_else(|| Error::Unauthorized("no Bluesky app password configured".into()))?;

        let url = self.xrpc_url("com.atproto.server.createSession");
        let resp = self
            .http
            .post(&url)
            .json(&json!({
                "identifier": self.identifier,
                "password": password,
            }))
            .send()
            .await
            .map_err(|e| Error::http("bluesky", format!("createSession: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::BAD_REQUEST
        {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Unauthorized(format!("createSession rejected: {body}")));
        }
        if !status.is_success() {
            return Err(Error::http("bluesky", format!("createSession: status {status}")));
        }

        let session: BlueskySession = resp
            .json()
            .await
            .map_err(|e| Error::http("bluesky", format!("createSession parse: {e}")))?;

        tracing::debug!(did = %session.did, "Bluesky session established");
        *self.session.write() = Some(session.clone());
        Ok(session)
    }

    /// Cached session, logging in on first use.
    async fn current_session(&self) -> Result<BlueskySession> {
        if let Some(session) = self.session.read().clone() {
            return Ok(session);
        }
        self.create_session().await
    }

    fn clear_session(&self) {
        *self.session.write() = None;
    }

    /// True when login with the configured credentials succeeds.
    pub async fn check_login(&self) -> bool {
        self.create_session().await.is_ok()
    }

    /// Upload raw image bytes; returns the blob reference to embed.
    pub async fn upload_blob(
        &self,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<serde_json::Value> {
        let mut session = self.current_session().await?;
        let url = self.xrpc_url("com.atproto.repo.uploadBlob");

        for attempt in 0..2 {
            let resp = self
                .http
                .post(&url)
                .bearer_auth(&session.access_jwt)
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(bytes.to_vec())
                .send()
                .await
                .map_err(|e| Error::http("bluesky", format!("uploadBlob: {e}")))?;

            let status = resp.status();
            if status == reqwest::StatusCode::UNAUTHORIZED && attempt == 0 {
                // Stale JWT; re-login and retry once.
                self.clear_session();
                session = self.create_session().await?;
                continue;
            }
            if !status.is_success() {
                return Err(Error::http("bluesky", format!("uploadBlob: status {status}")));
            }

            let body: serde_json::Value = resp
                .json()
                .await
                .map_err(|e| Error::http("bluesky", format!("uploadBlob parse: {e}")))?;
            return body
                .get("blob")
                .cloned()
                .ok_or_else(|| Error::http("bluesky", "uploadBlob: no blob in response"));
        }
        unreachable!("upload loop always returns within two attempts")
    }

    /// Publish a post, optionally with one embedded image.
    pub async fn publish_post(&self, text: &str, image: Option<PostImage<'_>>) -> Result<PostRef> {
        let mut record = json!({
            "$type": POST_COLLECTION,
            "text": text,
            "createdAt": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        });

        if let Some(img) = image {
            let blob = self.upload_blob(img.bytes, img.content_type).await?;
            record["embed"] = json!({
                "$type": "app.bsky.embed.images",
                "images": [{ "alt": img.alt, "image": blob }],
            });
        }

        let mut session = self.current_session().await?;
        let url = self.xrpc_url("com.atproto.repo.createRecord");

        for attempt in 0..2 {
            let body = json!({
                "collection": POST_COLLECTION,
                "repo": session.did,
                "record": record,
            });
            let resp = self
                .http
                .post(&url)
                .bearer_auth(&session.access_jwt)
                .json(&body)
                .send()
                .await
                .map_err(|e| Error::http("bluesky", format!("createRecord: {e}")))?;

            let status = resp.status();
            if status == reqwest::StatusCode::UNAUTHORIZED && attempt == 0 {
                self.clear_session();
                session = self.create_session().await?;
                continue;
            }
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(Error::http(
                    "bluesky",
                    format!("createRecord: status {status}: {text}"),
                ));
            }

            return resp
                .json::<PostRef>()
                .await
                .map_err(|e| Error::http("bluesky", format!("createRecord parse: {e}")));
        }
        unreachable!("publish loop always returns within two attempts")
    }
}
