//! The captions endpoint.
//!
//! A request carries `{"url": "..."}`. The handler pulls the video ID out of
//! the URL, asks the [`CaptionProvider`] for English captions and answers with
//! an [`Envelope`]. Provider failures of any kind are reported as a normal
//! `200` with `status: false`; everything unexpected becomes a generic `500`.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use eyre::{Result, WrapErr};
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use tower_http::catch_panic::CatchPanicLayer;

use crate::{CAPTION_LANG, CaptionProvider, extract_video_id, output};

pub const INVALID_JSON: &str = "Invalid JSON";
pub const NO_URL: &str = "No URL provided";
pub const INVALID_URL: &str = "Invalid URL";
pub const NO_CAPTIONS: &str = "No captions available";
pub const INTERNAL_ERROR: &str = "Internal server error";

/// JSON body of every response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    pub fn captions(text: impl Into<String>) -> Self {
        Self {
            status: true,
            captions: Some(text.into()),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: false,
            captions: None,
            message: Some(message.into()),
        }
    }
}

/// Status code plus envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub envelope: Envelope,
}

impl Reply {
    fn new(status: StatusCode, envelope: Envelope) -> Self {
        Self { status, envelope }
    }

    fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, Envelope::failure(message))
    }

    fn no_captions() -> Self {
        Self::new(StatusCode::OK, Envelope::failure(NO_CAPTIONS))
    }

    fn internal_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, Envelope::failure(INTERNAL_ERROR))
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

/// Shared per-router state; the provider is built once at startup
#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn CaptionProvider>,
    fetch_timeout: Duration,
    max_body_bytes: usize,
}

impl AppState {
    pub fn new(provider: Arc<dyn CaptionProvider>, fetch_timeout: Duration, max_body_bytes: usize) -> Self {
        Self {
            provider,
            fetch_timeout,
            max_body_bytes,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(captions))
        .route("/api", post(captions))
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

async fn captions(State(state): State<AppState>, body: Body) -> Reply {
    handle(&state, body).await
}

/// Run one request through parsing, extraction and caption lookup
pub async fn handle(state: &AppState, body: Body) -> Reply {
    let reply = match respond(state, body).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Request failed: {e:#}");
            Reply::internal_error()
        }
    };

    info!(
        "{} status={} {}",
        reply.status.as_u16(),
        reply.envelope.status,
        reply.envelope.message.as_deref().unwrap_or("captions returned")
    );
    reply
}

async fn respond(state: &AppState, body: Body) -> Result<Reply> {
    let bytes = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .wrap_err("failed to read request body")?;

    let url = match read_url(&bytes) {
        Ok(UrlField::Present(url)) => url,
        Ok(UrlField::Missing) => return Ok(Reply::bad_request(NO_URL)),
        Ok(UrlField::NotText) => return Ok(Reply::bad_request(INVALID_URL)),
        Err(e) => {
            debug!("Rejecting body: {e}");
            return Ok(Reply::bad_request(INVALID_JSON));
        }
    };

    let Some(video_id) = extract_video_id(&url) else {
        debug!("No video ID in {url:?}");
        return Ok(Reply::bad_request(INVALID_URL));
    };

    // The fetch runs as its own task so a provider panic stays a provider failure
    let provider = Arc::clone(&state.provider);
    let id = video_id.clone();
    let task = tokio::spawn(async move { provider.fetch(&id, CAPTION_LANG).await });
    let abort = task.abort_handle();

    let transcript = match tokio::time::timeout(state.fetch_timeout, task).await {
        Ok(Ok(Ok(transcript))) => transcript,
        Ok(Ok(Err(e))) => {
            warn!("Captions unavailable for {video_id}: {e:#}");
            return Ok(Reply::no_captions());
        }
        Ok(Err(e)) => {
            warn!("Captions unavailable for {video_id}: provider task failed: {e}");
            return Ok(Reply::no_captions());
        }
        Err(_) => {
            abort.abort();
            warn!("Captions unavailable for {video_id}: timed out after {:?}", state.fetch_timeout);
            return Ok(Reply::no_captions());
        }
    };

    let text = output::render_captions(&transcript);
    if text.is_empty() {
        warn!("Captions unavailable for {video_id}: transcript is empty");
        return Ok(Reply::no_captions());
    }

    debug!("Fetched {} segments for {video_id} ({})", transcript.segments.len(), transcript.title);
    Ok(Reply::new(StatusCode::OK, Envelope::captions(text)))
}

enum UrlField {
    Present(String),
    Missing,
    NotText,
}

fn read_url(body: &[u8]) -> serde_json::Result<UrlField> {
    let mut fields: Map<String, Value> = serde_json::from_slice(body)?;
    Ok(match fields.remove("url") {
        Some(Value::String(url)) if !url.is_empty() => UrlField::Present(url),
        Some(value) if !is_blank(&value) => UrlField::NotText,
        _ => UrlField::Missing,
    })
}

/// `null`, `false`, zero and empty strings, arrays or objects
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {detail}");
    Reply::internal_error().into_response()
}
