use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use eyre::{Result, bail};
use serde_json::{Value, json};
use tower::ServiceExt;

use ytcap::handler::{AppState, router};
use ytcap::{CaptionProvider, Segment, Transcript};

/// Returns the same fragments for every video
struct FixedProvider(Vec<&'static str>);

#[async_trait]
impl CaptionProvider for FixedProvider {
    async fn fetch(&self, video_id: &str, lang: &str) -> Result<Transcript> {
        Ok(Transcript {
            video_id: video_id.to_string(),
            title: "Rick Astley - Never Gonna Give You Up".to_string(),
            language: lang.to_string(),
            segments: self
                .0
                .iter()
                .enumerate()
                .map(|(i, text)| Segment {
                    text: text.to_string(),
                    start: i as f64 * 1.5,
                    duration: 1.5,
                })
                .collect(),
        })
    }
}

struct DisabledProvider;

#[async_trait]
impl CaptionProvider for DisabledProvider {
    async fn fetch(&self, video_id: &str, _lang: &str) -> Result<Transcript> {
        bail!("transcripts are disabled for video {video_id}")
    }
}

struct PanickingProvider;

#[async_trait]
impl CaptionProvider for PanickingProvider {
    async fn fetch(&self, _video_id: &str, _lang: &str) -> Result<Transcript> {
        panic!("provider blew up: secret detail")
    }
}

fn app(provider: impl CaptionProvider + 'static) -> axum::Router {
    router(AppState::new(Arc::new(provider), Duration::from_secs(5), 64 * 1024))
}

async fn post(app: axum::Router, path: &str, body: &'static str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

fn rick() -> FixedProvider {
    FixedProvider(vec!["Never", "gonna", "give"])
}

#[tokio::test]
async fn test_watch_url_returns_captions() {
    let (status, body) = post(app(rick()), "/", r#"{"url":"https://www.youtube.com/watch?v=dQw4w9WgXcQ"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": true, "captions": "Never gonna give"}));
}

#[tokio::test]
async fn test_short_link_returns_same_captions() {
    let (status, body) = post(app(rick()), "/", r#"{"url":"https://youtu.be/dQw4w9WgXcQ"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": true, "captions": "Never gonna give"}));
}

#[tokio::test]
async fn test_api_path_is_served() {
    let (status, body) = post(app(rick()), "/api", r#"{"url":"https://youtu.be/dQw4w9WgXcQ"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!(true));
}

#[tokio::test]
async fn test_not_a_url() {
    let (status, body) = post(app(rick()), "/", r#"{"url":"not a url"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": false, "message": "Invalid URL"}));
}

#[tokio::test]
async fn test_missing_url_key() {
    let (status, body) = post(app(rick()), "/", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": false, "message": "No URL provided"}));
}

#[tokio::test]
async fn test_empty_url() {
    let (status, body) = post(app(rick()), "/", r#"{"url":""}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": false, "message": "No URL provided"}));
}

#[tokio::test]
async fn test_transcripts_disabled() {
    let (status, body) = post(app(DisabledProvider), "/", r#"{"url":"https://www.youtube.com/watch?v=dQw4w9WgXcQ"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": false, "message": "No captions available"}));
}

#[tokio::test]
async fn test_truncated_json() {
    let (status, body) = post(app(rick()), "/", r#"{"url":"https://youtu.be/dQw4"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": false, "message": "Invalid JSON"}));
}

#[tokio::test]
async fn test_missing_content_type_is_accepted() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .body(Body::from(r#"{"url":"https://youtu.be/dQw4w9WgXcQ"}"#))
        .unwrap();
    let response = app(rick()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_same_request_same_response() {
    let app = app(rick());
    let body = r#"{"url":"https://www.youtube.com/watch?v=dQw4w9WgXcQ"}"#;
    let first = post(app.clone(), "/", body).await;
    let second = post(app, "/", body).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_provider_panic_is_no_captions() {
    let (status, body) = post(app(PanickingProvider), "/", r#"{"url":"https://youtu.be/dQw4w9WgXcQ"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": false, "message": "No captions available"}));
    assert!(!body.to_string().contains("secret"));
}

#[tokio::test]
async fn test_false_url_is_missing() {
    let (status, body) = post(app(rick()), "/", r#"{"url":false}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": false, "message": "No URL provided"}));
}

#[tokio::test]
async fn test_get_not_allowed() {
    let request = Request::builder().method(Method::GET).uri("/").body(Body::empty()).unwrap();
    let response = app(rick()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
