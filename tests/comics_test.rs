//! Integration tests for comic query routes.

mod common;

use common::TestHarness;

#[tokio::test]
async fn list_comics_empty() {
    let (_h, addr) = TestHarness::with_server().await;
    let resp = reqwest::get(format!("http://{addr}/api/comics"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let comics: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert!(comics.is_empty());
}

#[tokio::test]
async fn list_comics_newest_first() {
    let (h, addr) = TestHarness::with_server().await;
    h.seed_comic("2024-01-14", false);
    h.seed_comic("2024-01-16", false);
    h.seed_comic("2024-01-15", false);

    let resp = reqwest::get(format!("http://{addr}/api/comics"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let comics: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert_eq!(comics.len(), 3);
    assert_eq!(comics[0]["strip_date"], "2024-01-16");
    assert_eq!(comics[2]["strip_date"], "2024-01-14");
}

#[tokio::test]
async fn list_comics_posted_filter() {
    let (h, addr) = TestHarness::with_server().await;
    h.seed_comic("2024-01-14", true);
    h.seed_comic("2024-01-15", false);

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/api/comics?posted=false"))
        .send()
        .await
        .unwrap();
    let comics: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert_eq!(comics.len(), 1);
    assert_eq!(comics[0]["strip_date"], "2024-01-15");
    assert_eq!(comics[0]["posted"], false);

    let resp = client
        .get(format!("http://{addr}/api/comics?posted=true"))
        .send()
        .await
        .unwrap();
    let comics: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert_eq!(comics.len(), 1);
    assert_eq!(comics[0]["strip_date"], "2024-01-14");
}

#[tokio::test]
async fn list_comics_pagination() {
    let (h, addr) = TestHarness::with_server().await;
    for day in 10..15 {
        h.seed_comic(&format!("2024-01-{day}"), false);
    }

    let resp = reqwest::get(format!("http://{addr}/api/comics?offset=1&limit=2"))
        .await
        .unwrap();
    let comics: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert_eq!(comics.len(), 2);
    assert_eq!(comics[0]["strip_date"], "2024-01-13");
    assert_eq!(comics[1]["strip_date"], "2024-01-12");
}

#[tokio::test]
async fn get_comic_by_date() {
    let (h, addr) = TestHarness::with_server().await;
    h.seed_comic("2024-01-15", false);

    let resp = reqwest::get(format!("http://{addr}/api/comics/2024-01-15"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let comic: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(comic["strip_date"], "2024-01-15");
    assert_eq!(comic["title"], "Strip for 2024-01-15");
    assert_eq!(comic["posted"], false);
    assert_eq!(comic["storage_path"], "test_2024-01-15.png");
}

#[tokio::test]
async fn get_comic_invalid_date() {
    let (_h, addr) = TestHarness::with_server().await;
    let resp = reqwest::get(format!("http://{addr}/api/comics/not-a-date"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn get_comic_not_found() {
    let (_h, addr) = TestHarness::with_server().await;
    let resp = reqwest::get(format!("http://{addr}/api/comics/1999-12-31"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "not_found");
}
