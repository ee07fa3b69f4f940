pub mod config;
pub mod handler;
pub mod output;
pub mod youtube;

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

/// Language requested from every provider
pub const CAPTION_LANG: &str = "en";

/// A single captioned segment
#[derive(Debug, Clone)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Complete transcript for a video
#[derive(Debug, Clone)]
pub struct Transcript {
    pub video_id: String,
    pub title: String,
    pub language: String,
    pub segments: Vec<Segment>,
}

/// Source of captions for a video ID
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    async fn fetch(&self, video_id: &str, lang: &str) -> eyre::Result<Transcript>;
}

// v=ID or /ID
static GENERAL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("valid video id pattern"));

// youtu.be/ID
static SHORT_LINK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtu\.be/([0-9A-Za-z_-]{11})").expect("valid short link pattern"));

/// Extract video ID from a YouTube URL
pub fn extract_video_id(url: &str) -> Option<String> {
    if !url.contains("youtube.com") && !url.contains("youtu.be") {
        return None;
    }

    [&*GENERAL_ID, &*SHORT_LINK_ID]
        .into_iter()
        .find_map(|re| re.captures(url))
        .map(|caps| caps[1].to_string())
}
