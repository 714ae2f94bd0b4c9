use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use log::{debug, warn};

use crate::VideoId;
use crate::error::Result;

/// Entries older than this are removed by the sweep
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Outcome of an expiry sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub removed: usize,
    pub failed: usize,
}

/// One `<video_id>.txt` file per video under a single root directory.
///
/// Files hold the raw subtitle body as downloaded. No locking is done, so
/// concurrent processes sharing a root may race on the sweep.
#[derive(Debug, Clone)]
pub struct SubtitleCache {
    root: PathBuf,
    ttl: Duration,
}

impl SubtitleCache {
    /// Open a cache rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_ttl(root, DEFAULT_TTL)
    }

    pub fn with_ttl(root: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root, ttl })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, video_id: &VideoId) -> PathBuf {
        self.root.join(format!("{video_id}.txt"))
    }

    /// Read a cached entry. Freshness is not checked; that is the sweep's job.
    pub fn load(&self, video_id: &VideoId) -> Result<Option<String>> {
        let path = self.path_for(video_id);
        match std::fs::read_to_string(&path) {
            Ok(data) => {
                debug!("Cache hit: {}", path.display());
                Ok(Some(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Cache miss: {}", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write an entry via a temp file and rename, so readers never see a partial file.
    pub fn store(&self, video_id: &VideoId, raw: &str) -> Result<PathBuf> {
        let path = self.path_for(video_id);
        let tmp = self.root.join(format!(".{video_id}.txt.tmp"));
        std::fs::write(&tmp, raw)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!("Cached subtitles: {}", path.display());
        Ok(path)
    }

    /// Delete every regular file directly under the root whose mtime is older than the TTL.
    pub fn sweep(&self) -> Result<SweepStats> {
        self.sweep_at(SystemTime::now())
    }

    /// Sweep as if the current time were `now`.
    ///
    /// A file that cannot be inspected or removed is counted as failed and
    /// skipped; only failing to list the root is an error.
    pub fn sweep_at(&self, now: SystemTime) -> Result<SweepStats> {
        let mut stats = SweepStats::default();

        for entry in std::fs::read_dir(&self.root)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable cache entry: {e}");
                    stats.failed += 1;
                    continue;
                }
            };
            let path = entry.path();

            let modified = match entry.metadata().and_then(|m| {
                if m.is_file() { m.modified().map(Some) } else { Ok(None) }
            }) {
                Ok(Some(modified)) => modified,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Could not stat {}: {e}", path.display());
                    stats.failed += 1;
                    continue;
                }
            };

            // Files with a future mtime count as fresh
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= self.ttl {
                continue;
            }

            match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Expired cache entry removed: {}", path.display());
                    stats.removed += 1;
                }
                Err(e) => {
                    warn!("Could not remove expired cache entry {}: {e}", path.display());
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }
}
