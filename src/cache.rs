//! Per-package report cache.
//!
//! OSS Index reports are stored one file per purl under the user cache
//! directory (`~/.cache/depaudit` on Linux, `~/Library/Caches/depaudit` on
//! macOS, `%LOCALAPPDATA%\depaudit` on Windows). Every entry records when it
//! was written and is ignored, then deleted, once older than the TTL.
//!
//! ```no_run
//! use depaudit::Cache;
//! use depaudit::model::Coordinate;
//!
//! let cache = Cache::with_ttl_hours(1);
//! let purl = "pkg:golang/github.com/pkg/errors@v0.9.1";
//! cache.set(purl, &Coordinate::new(purl)).unwrap();
//!
//! let hit: Option<Coordinate> = cache.get(purl);
//! assert!(hit.is_some());
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::DEFAULT_CACHE_TTL_HOURS;

pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("depaudit")
}

#[derive(Serialize, Deserialize)]
struct Stored<T> {
    stored_at: DateTime<Utc>,
    value: T,
}

/// File cache keyed by purl.
pub struct Cache {
    dir: PathBuf,
    ttl: Duration,
}

impl Cache {
    pub fn new() -> Self {
        Self::with_ttl_hours(DEFAULT_CACHE_TTL_HOURS)
    }

    pub fn with_ttl_hours(hours: u64) -> Self {
        Self::in_dir(cache_dir(), Duration::from_secs(hours.saturating_mul(3600)))
    }

    pub fn in_dir(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// One JSON file per key. Bytes outside `[A-Za-z0-9.-]` are written as
    /// `_` plus two hex digits, so distinct keys never share a file.
    fn entry_path(&self, key: &str) -> PathBuf {
        let mut file_stem = String::with_capacity(key.len() + 8);
        for byte in key.bytes() {
            match byte {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' => {
                    file_stem.push(char::from(byte))
                }
                _ => file_stem.push_str(&format!("_{:02x}", byte)),
            }
        }
        self.dir.join(file_stem + ".json")
    }

    fn is_stale(&self, stored_at: DateTime<Utc>) -> bool {
        // An entry stamped in the future counts as fresh.
        match (Utc::now() - stored_at).to_std() {
            Ok(age) => age > self.ttl,
            Err(_) => false,
        }
    }

    /// Returns the cached value, or `None` when absent, unreadable or stale.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.entry_path(key);
        let content = fs::read_to_string(&path).ok()?;

        let stored: Stored<T> = match serde_json::from_str(&content) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "discarding unreadable cache entry");
                let _ = fs::remove_file(&path);
                return None;
            }
        };

        if self.is_stale(stored.stored_at) {
            tracing::trace!(key, "cache entry expired");
            let _ = fs::remove_file(&path);
            return None;
        }
        Some(stored.value)
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create cache dir {}", self.dir.display()))?;

        let path = self.entry_path(key);
        let stored = Stored {
            stored_at: Utc::now(),
            value,
        };
        fs::write(&path, serde_json::to_vec(&stored)?)
            .with_context(|| format!("failed to write cache entry {}", path.display()))
    }

    /// Deletes the cache directory and everything in it.
    pub fn remove_all(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {
                tracing::info!(dir = %self.dir.display(), "removed cache");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("failed to remove cache dir {}", self.dir.display())),
        }
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinate, Vulnerability};

    const PURL: &str = "pkg:golang/github.com/gorilla/websocket@v1.4.0";

    fn temp_cache(ttl: Duration) -> (tempfile::TempDir, Cache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::in_dir(dir.path().join("cache"), ttl);
        (dir, cache)
    }

    #[test]
    fn test_coordinate_survives_cache() {
        let (_dir, cache) = temp_cache(Duration::from_secs(3600));
        let coordinate = Coordinate::new(PURL)
            .with_vulnerabilities(vec![Vulnerability::new("a1").with_cve("CVE-2020-27813")]);
        cache.set(PURL, &coordinate).unwrap();

        assert_eq!(cache.get::<Coordinate>(PURL), Some(coordinate));
    }

    #[test]
    fn test_missing_key() {
        let (_dir, cache) = temp_cache(Duration::from_secs(3600));
        assert!(cache.get::<Coordinate>(PURL).is_none());
    }

    #[test]
    fn test_stale_entry_is_dropped() {
        let (_dir, cache) = temp_cache(Duration::ZERO);
        cache.set(PURL, &Coordinate::new(PURL)).unwrap();
        std::thread::sleep(Duration::from_millis(20));

        assert!(cache.get::<Coordinate>(PURL).is_none());
        assert!(!cache.entry_path(PURL).exists());
    }

    #[test]
    fn test_garbage_entry_is_dropped() {
        let (_dir, cache) = temp_cache(Duration::from_secs(3600));
        fs::create_dir_all(cache.dir()).unwrap();
        fs::write(cache.entry_path(PURL), "not json").unwrap();

        assert!(cache.get::<Coordinate>(PURL).is_none());
        assert!(!cache.entry_path(PURL).exists());
    }

    #[test]
    fn test_entry_path_encoding() {
        let (_dir, cache) = temp_cache(Duration::from_secs(1));
        let path = cache.entry_path("pkg:golang/a/b@v1.0.0");
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "pkg_3agolang_2fa_2fb_40v1.0.0.json"
        );
    }

    #[test]
    fn test_similar_purls_do_not_share_entries() {
        let (_dir, cache) = temp_cache(Duration::from_secs(3600));
        let underscored = "pkg:golang/github.com/foo_bar/baz@v1.0.0";
        let slashed = "pkg:golang/github.com/foo/bar_baz@v1.0.0";
        assert_ne!(cache.entry_path(underscored), cache.entry_path(slashed));

        let coordinate = Coordinate::new(underscored)
            .with_vulnerabilities(vec![Vulnerability::new("a1")]);
        cache.set(underscored, &coordinate).unwrap();

        assert_eq!(cache.get::<Coordinate>(underscored), Some(coordinate));
        assert!(cache.get::<Coordinate>(slashed).is_none());
    }

    #[test]
    fn test_remove_all() {
        let (_dir, cache) = temp_cache(Duration::from_secs(3600));
        cache.set(PURL, &Coordinate::new(PURL)).unwrap();
        assert!(cache.dir().exists());

        cache.remove_all().unwrap();
        assert!(!cache.dir().exists());

        // Nothing left to remove.
        cache.remove_all().unwrap();
    }
}
