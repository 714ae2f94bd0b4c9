use log::{debug, info, warn};

use crate::cache::SubtitleCache;
use crate::error::{QvError, Result};
use crate::subtitles;
use crate::youtube::{SubtitleLocator, Transport};
use crate::{VideoId, extract_video_id};

/// Cleaned text shorter than this usually means the captions are degraded or missing
pub const SHORT_CONTENT_CHARS: usize = 100;

/// Cleaned subtitle text for one video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtitles {
    pub video_id: VideoId,
    pub text: String,
    pub from_cache: bool,
}

impl Subtitles {
    pub fn is_short(&self) -> bool {
        self.text.chars().count() < SHORT_CONTENT_CHARS
    }
}

/// Returns cleaned subtitles from the cache, or fetches and caches them
pub struct Fetcher<'a> {
    cache: &'a SubtitleCache,
    locator: &'a dyn SubtitleLocator,
    transport: &'a dyn Transport,
}

impl<'a> Fetcher<'a> {
    pub fn new(cache: &'a SubtitleCache, locator: &'a dyn SubtitleLocator, transport: &'a dyn Transport) -> Self {
        Self {
            cache,
            locator,
            transport,
        }
    }

    /// Fetch the cleaned subtitles for `url`.
    ///
    /// A cached entry is used as-is if present. Otherwise expired entries are
    /// swept, the track URL is located, the raw body is downloaded and stored,
    /// and the cleaned text is returned. Short results are logged, not rejected.
    pub async fn fetch(&self, url: &str) -> Result<Subtitles> {
        let video_id = extract_video_id(url).ok_or_else(|| QvError::IdExtraction(url.to_string()))?;

        if let Some(raw) = self.cache.load(&video_id)? {
            return Ok(self.finish(video_id, &raw, true));
        }

        let stats = self.cache.sweep()?;
        if stats.removed > 0 || stats.failed > 0 {
            info!("Cache sweep: {} removed, {} failed", stats.removed, stats.failed);
        }

        let sub_url = self.locator.subtitle_url(url).await?;
        if sub_url.is_empty() {
            return Err(QvError::SubtitleUnavailable(video_id.to_string()));
        }

        let raw = self.transport.get(&sub_url).await?;
        self.cache.store(&video_id, &raw)?;

        Ok(self.finish(video_id, &raw, false))
    }

    fn finish(&self, video_id: VideoId, raw: &str, from_cache: bool) -> Subtitles {
        debug!(
            "Cleaning {} subtitles for {video_id} ({} bytes)",
            subtitles::SubtitleFormat::detect(raw),
            raw.len()
        );
        let subs = Subtitles {
            video_id,
            text: subtitles::normalize(raw),
            from_cache,
        };
        if subs.is_short() {
            warn!(
                "Subtitles for {} are only {} characters; results may be inaccurate",
                subs.video_id,
                subs.text.chars().count()
            );
        }
        subs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, SystemTime};

    const URL: &str = "https://youtu.be/dQw4w9WgXcQ";

    fn long_srt() -> String {
        let mut raw = String::new();
        for i in 1..=20 {
            raw.push_str(&format!("{i}\n00:00:{i:02},000 --> 00:00:{i:02},900\n<i>caption number {i}</i>\n\n"));
        }
        raw
    }

    struct FakeLocator {
        url: String,
        calls: AtomicUsize,
    }

    impl FakeLocator {
        fn new(url: &str) -> Self {
            Self {
                url: url.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SubtitleLocator for FakeLocator {
        async fn subtitle_url(&self, _url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.url.clone())
        }

        async fn title(&self, _url: &str) -> Result<String> {
            Ok("Test Video".to_string())
        }
    }

    struct FakeTransport {
        body: std::result::Result<String, String>,
        calls: AtomicUsize,
    }

    impl FakeTransport {
        fn ok(body: &str) -> Self {
            Self {
                body: Ok(body.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                body: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get(&self, _url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body.clone().map_err(|m| QvError::tool("curl", m))
        }
    }

    #[tokio::test]
    async fn test_fetch_miss_stores_raw_and_returns_clean() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SubtitleCache::open(dir.path()).unwrap();
        let locator = FakeLocator::new("https://example.com/subs");
        let raw = long_srt();
        let transport = FakeTransport::ok(&raw);

        let subs = Fetcher::new(&cache, &locator, &transport).fetch(URL).await.unwrap();

        assert!(!subs.from_cache);
        assert_eq!(subs.video_id.as_str(), "dQw4w9WgXcQ");
        assert!(subs.text.starts_with("caption number 1 caption number 2"));
        assert!(!subs.is_short());
        let stored = std::fs::read_to_string(dir.path().join("dQw4w9WgXcQ.txt")).unwrap();
        assert_eq!(stored, raw);
    }

    #[tokio::test]
    async fn test_fetch_hit_skips_collaborators() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SubtitleCache::open(dir.path()).unwrap();
        let locator = FakeLocator::new("https://example.com/subs");
        let transport = FakeTransport::ok(&long_srt());
        let fetcher = Fetcher::new(&cache, &locator, &transport);

        let first = fetcher.fetch(URL).await.unwrap();
        let second = fetcher.fetch("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await.unwrap();

        assert_eq!(first.text, second.text);
        assert!(second.from_cache);
        assert_eq!(locator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_empty_track_url_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SubtitleCache::open(dir.path()).unwrap();
        let locator = FakeLocator::new("");
        let transport = FakeTransport::ok("unused");

        let err = Fetcher::new(&cache, &locator, &transport).fetch(URL).await.unwrap_err();

        assert!(matches!(err, QvError::SubtitleUnavailable(ref id) if id == "dQw4w9WgXcQ"));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join("dQw4w9WgXcQ.txt").exists());
    }

    #[tokio::test]
    async fn test_fetch_transport_failure_leaves_no_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SubtitleCache::open(dir.path()).unwrap();
        let locator = FakeLocator::new("https://example.com/subs");
        let transport = FakeTransport::failing("exited with 22");

        let err = Fetcher::new(&cache, &locator, &transport).fetch(URL).await.unwrap_err();

        assert!(matches!(err, QvError::ExternalTool { .. }));
        assert!(!dir.path().join("dQw4w9WgXcQ.txt").exists());
    }

    #[tokio::test]
    async fn test_fetch_without_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SubtitleCache::open(dir.path()).unwrap();
        let locator = FakeLocator::new("https://example.com/subs");
        let transport = FakeTransport::ok("unused");

        let err = Fetcher::new(&cache, &locator, &transport)
            .fetch("https://vimeo.com/12345")
            .await
            .unwrap_err();

        assert!(matches!(err, QvError::IdExtraction(_)));
        assert_eq!(locator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_short_content_still_returned() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SubtitleCache::open(dir.path()).unwrap();
        let locator = FakeLocator::new("https://example.com/subs");
        let transport = FakeTransport::ok("1\n00:00:01,000 --> 00:00:02,000\n[Music]\n\n2\n00:00:02,000 --> 00:00:03,000\nHi\n");

        let subs = Fetcher::new(&cache, &locator, &transport).fetch(URL).await.unwrap();

        assert_eq!(subs.text, "Hi");
        assert!(subs.is_short());
    }

    #[tokio::test]
    async fn test_fetch_miss_sweeps_expired_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SubtitleCache::open(dir.path()).unwrap();
        let stale = cache.store(&VideoId::new("aaaaaaaaaaa").unwrap(), "old").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&stale)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(8 * 24 * 60 * 60))
            .unwrap();

        let locator = FakeLocator::new("https://example.com/subs");
        let transport = FakeTransport::ok(&long_srt());
        Fetcher::new(&cache, &locator, &transport).fetch(URL).await.unwrap();

        assert!(!stale.exists());
        assert!(dir.path().join("dQw4w9WgXcQ.txt").exists());
    }
}
