pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod llm;
pub mod output;
pub mod subtitles;
pub mod tools;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;

pub use error::{QvError, Result};

static WATCH_OR_SHORT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://(?:www\.)?(?:youtube\.com/watch\?v=[a-zA-Z0-9_-]{11}|youtu\.be/[a-zA-Z0-9_-]{11})(?:\?.*)?$")
        .expect("valid URL regex")
});

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:v=|be/)([a-zA-Z0-9_-]{11})").expect("valid ID regex"));

static BARE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("valid ID regex"));

/// An 11-character YouTube video identifier, used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Wrap a bare identifier, rejecting anything that is not exactly 11 `[a-zA-Z0-9_-]` characters.
    pub fn new(id: &str) -> Option<Self> {
        BARE_ID.is_match(id).then(|| VideoId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check that `url` is a full `https://[www.]youtube.com/watch?v=ID` or
/// `https://[www.]youtu.be/ID` link, optionally followed by a `?query`.
///
/// The whole string must match; no network access is performed.
pub fn validate_url(url: &str) -> bool {
    WATCH_OR_SHORT_URL.is_match(url)
}

/// Extract the video ID from the first `v=<id>` or `be/<id>` found anywhere in `url`.
///
/// This is a substring search and accepts strings `validate_url` rejects.
/// Call `validate_url` first; never use this as a format check on its own.
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    ID_PATTERN.captures(url).map(|caps| VideoId(caps[1].to_string()))
}

/// Validate `url` and extract its ID in one step.
pub fn resolve(url: &str) -> Result<VideoId> {
    if !validate_url(url) {
        return Err(QvError::Validation(url.to_string()));
    }
    extract_video_id(url).ok_or_else(|| QvError::IdExtraction(url.to_string()))
}
