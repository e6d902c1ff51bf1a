//! Comic page scraper and image downloader.
//!
//! Fetches a GoComics-style strip page for a given date and pulls the strip
//! image URL and title out of the page's OpenGraph metadata.

use chrono::NaiveDate;
use scraper::{Html, Selector};
use stripbot_core::{config::ComicConfig, Error, Result};

/// A successfully scraped strip.
#[derive(Debug, Clone)]
pub struct FetchedStrip {
    pub strip_date: NaiveDate,
    pub image_url: String,
    pub title: Option<String>,
}

/// Scrapes strip pages and downloads images.
pub struct StripFetcher {
    http: reqwest::Client,
    page_base: String,
    slug: String,
}

impl StripFetcher {
    pub fn new(config: &ComicConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            page_base: config.page_base.trim_end_matches('/').to_string(),
            slug: config.slug.clone(),
        }
    }

    /// URL of the strip page for a date: `{base}/{slug}/{YYYY}/{MM}/{DD}`.
    pub fn page_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/{}/{}",
            self.page_base,
            self.slug,
            date.format("%Y/%m/%d")
        )
    }

    /// Fetch and parse the strip page for `date`.
    ///
    /// The site redirects requests for dates with no strip to a different
    /// page; a final URL that does not carry the requested date is treated as
    /// not-found rather than scraping whatever came back.
    pub async fn fetch_strip(&self, date: NaiveDate) -> Result<FetchedStrip> {
        let url = self.page_url(date);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::http("gocomics", format!("GET {url}: {e}")))?;

        if !resp.status().is_success() {
            return Err(Error::http(
                "gocomics",
                format!("GET {url}: status {}", resp.status()),
            ));
        }

        let date_path = date.format("%Y/%m/%d").to_string();
        if !resp.url().path().contains(&date_path) {
            return Err(Error::not_found("comic", date));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::http("gocomics", format!("read {url}: {e}")))?;

        let (image_url, title) = extract_strip(&body)?;
        let image_url =
            image_url.ok_or_else(|| Error::Scrape(format!("no strip image found at {url}")))?;

        Ok(FetchedStrip {
            strip_date: date,
            image_url,
            title,
        })
    }

    /// Download the strip image bytes.
    pub async fn download_image(&self, image_url: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(image_url)
            .send()
            .await
            .map_err(|e| Error::http("gocomics", format!("GET {image_url}: {e}")))?;

        if !resp.status().is_success() {
            return Err(Error::http(
                "gocomics",
                format!("GET {image_url}: status {}", resp.status()),
            ));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::http("gocomics", format!("read {image_url}: {e}")))?;

        if bytes.is_empty() {
            return Err(Error::Scrape(format!("empty image body from {image_url}")));
        }
        Ok(bytes.to_vec())
    }

    /// Deterministic file name for a strip image, e.g. `calvinandhobbes_20240115.png`.
    pub fn image_file_name(&self, date: NaiveDate, image_url: &str) -> String {
        let ext = image_extension(image_url);
        format!("{}_{}.{ext}", self.slug, date.format("%Y%m%d"))
    }
}

/// Pull the image URL and title out of the page HTML.
///
/// Kept synchronous so the non-Send `Html` DOM never lives across an await.
fn extract_strip(html: &str) -> Result<(Option<String>, Option<String>)> {
    let doc = Html::parse_document(html);

    let og_image = Selector::parse(r#"meta[property="og:image"]"#)
        .map_err(|e| Error::Internal(format!("bad selector: {e}")))?;
    let og_title = Selector::parse(r#"meta[property="og:title"]"#)
        .map_err(|e| Error::Internal(format!("bad selector: {e}")))?;
    let any_img = Selector::parse("img[src]")
        .map_err(|e| Error::Internal(format!("bad selector: {e}")))?;

    let image_url = doc
        .select(&og_image)
        .find_map(|el| el.value().attr("content"))
        .map(str::to_string)
        .or_else(|| {
            // Fallback when the og tag is missing: first hosted strip asset.
            doc.select(&any_img)
                .filter_map(|el| el.value().attr("src"))
                .find(|src| src.contains("amuniversal") || src.contains("gocomics"))
                .map(str::to_string)
        });

    let title = doc
        .select(&og_title)
        .find_map(|el| el.value().attr("content"))
        .map(str::to_string)
        .filter(|t| !t.is_empty());

    Ok((image_url, title))
}

/// File extension from the image URL path, defaulting to png.
fn image_extension(image_url: &str) -> &str {
    let path = image_url
        .split(['?', '#'])
        .next()
        .unwrap_or(image_url);
    match path.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty()
                && ext.len() <= 4
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext
        }
        _ => "png",
    }
}
