//! Background posting loop and the fetch/post operations it drives.
//!
//! The same two operations back the scheduler, the admin endpoints, the CLI
//! one-shots, and the serverless entry points.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use stripbot_core::Result;
use stripbot_db::models::{NewComic, NewPost, Post};

use crate::bluesky::PostImage;
use crate::context::AppContext;
use crate::{format, storage};

/// Fetch strips for the last `days_back` days, walking backwards from today.
///
/// Dates already in the record store are skipped without re-downloading.
/// Per-date failures are logged and swallowed so one missing strip never
/// blocks the rest. Returns how many new comics were stored.
pub async fn fetch_new_comics(ctx: &AppContext, days_back: u32) -> Result<u32> {
    let today = Utc::now().date_naive();
    let mut stored = 0u32;

    for i in 0..days_back {
        let date = today - chrono::Duration::days(i64::from(i));

        match ctx.records.get_comic(date) {
            Ok(Some(_)) => continue,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(date = %date, "Record store lookup failed: {e}");
                continue;
            }
        }

        match fetch_and_store(ctx, date).await {
            Ok(()) => {
                stored += 1;
                tracing::info!(date = %date, "Stored new strip");
            }
            Err(e) => {
                tracing::warn!(date = %date, "Failed to fetch strip: {e}");
            }
        }
    }

    Ok(stored)
}

/// Scrape one date, download its image, store both.
async fn fetch_and_store(ctx: &AppContext, date: chrono::NaiveDate) -> Result<()> {
    let strip = ctx.fetcher.fetch_strip(date).await?;
    let bytes = ctx.fetcher.download_image(&strip.image_url).await?;

    let file_name = ctx.fetcher.image_file_name(date, &strip.image_url);
    let storage_path = ctx.images.put(&file_name, &bytes).await?;

    ctx.records.insert_comic(&NewComic {
        strip_date: date,
        image_url: strip.image_url,
        title: strip.title,
        storage_path,
    })?;
    Ok(())
}

/// Publish one random unposted comic to Bluesky.
///
/// Returns `Ok(None)` when the unposted buffer is empty. The comic is marked
/// posted only after Bluesky accepts the record, so a failed publish leaves
/// it in the buffer for the next attempt.
pub async fn create_post(ctx: &AppContext) -> Result<Option<Post>> {
    let unposted = ctx.records.list_unposted()?;
    if unposted.is_empty() {
        return Ok(None);
    }

    // Pick before any await; the thread-local RNG handle is not Send.
    let comic = {
        let idx = rand::random::<usize>() % unposted.len();
        unposted[idx].clone()
    };

    let bytes = ctx.images.get(&comic.storage_path).await?;
    let content_type = storage::content_type_for(&comic.storage_path);
    let text = format::compose(comic.strip_date, comic.title.as_deref());

    let post_ref = ctx
        .bluesky
        .publish_post(
            &text,
            Some(PostImage {
                bytes: &bytes,
                content_type,
                alt: &ctx.config.comic.alt_text,
            }),
        )
        .await?;

    let post = ctx.records.record_post(&NewPost {
        strip_date: comic.strip_date,
        bluesky_uri: post_ref.uri,
        bluesky_cid: post_ref.cid,
        post_text: text,
    })?;
    ctx.records.mark_posted(comic.strip_date)?;

    tracing::info!(date = %comic.strip_date, uri = %post.bluesky_uri, "Published strip");
    Ok(Some(post))
}

/// One scheduler pass: top up the buffer if it is low, then post once.
async fn tick(ctx: &AppContext) -> Result<()> {
    let counts = ctx.records.comic_counts()?;
    let low_water = ctx.config.scheduler.fetch_when_buffer_below;

    if (counts.unposted() as u32) < low_water {
        let stored = fetch_new_comics(ctx, ctx.config.comic.days_back).await?;
        tracing::info!(stored, "Buffer refill complete");
    }

    match create_post(ctx).await? {
        Some(_) => {}
        None => tracing::warn!("No unposted comics available"),
    }
    Ok(())
}

/// Run the posting loop until the cancellation token is triggered.
///
/// Tick errors are logged and followed by the shorter error backoff sleep;
/// the loop itself never exits on error.
pub async fn run_scheduler(ctx: AppContext, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = ctx.config.scheduler.post_interval_secs,
        "Scheduler started"
    );

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let sleep_secs = match tick(&ctx).await {
            Ok(()) => ctx.config.scheduler.post_interval_secs,
            Err(e) => {
                tracing::error!("Scheduler tick failed: {e}");
                ctx.config.scheduler.error_backoff_secs
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(sleep_secs)) => {}
            _ = cancel.cancelled() => break,
        }
    }

    tracing::info!("Scheduler stopped");
}
