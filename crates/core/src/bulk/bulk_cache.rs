//! Advisory archive cache.
//!
//! Key = (source name, period) -> cached archive bytes plus fetch time.
//! The staleness predicate lives in [`CachePolicy`]: an entry is fresh
//! while younger than the TTL, and entries for periods older than
//! `permanent_after_months` never go stale (closed disclosure months do
//! not change upstream).

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use super::archive::ArchivePeriod;
use super::bulk_errors::BulkError;
use super::bulk_source::BulkArchiveSource;

#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub permanent_after_months: i32,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(24),
            permanent_after_months: 3,
        }
    }
}

impl CachePolicy {
    pub fn is_fresh(
        &self,
        period: &ArchivePeriod,
        fetched_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        if period.age_in_months(now.date_naive()) >= self.permanent_after_months {
            return true;
        }
        now.signed_duration_since(fetched_at) <= self.ttl
    }
}

/// One cached archive.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub bytes: Vec<u8>,
    pub fetched_at: DateTime<Utc>,
}

/// Cache storage interface; injectable so tests use the in-memory fake.
pub trait ArchiveCache: Send + Sync {
    fn get(&self, source: &str, period: &ArchivePeriod) -> Result<Option<CacheEntry>, BulkError>;

    fn put(
        &self,
        source: &str,
        period: &ArchivePeriod,
        bytes: &[u8],
        fetched_at: DateTime<Utc>,
    ) -> Result<(), BulkError>;
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheMeta {
    fetched_at: DateTime<Utc>,
}

/// Filesystem cache: `{root}/{source}_{period}.zip` plus a `.meta` sidecar
/// with the fetch timestamp.
pub struct FsArchiveCache {
    root: PathBuf,
}

impl FsArchiveCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entry_path(&self, source: &str, period: &ArchivePeriod) -> PathBuf {
        self.root.join(format!("{}_{}.zip", source, period.key()))
    }

    fn meta_path(&self, source: &str, period: &ArchivePeriod) -> PathBuf {
        self.root.join(format!("{}_{}.meta", source, period.key()))
    }
}

impl ArchiveCache for FsArchiveCache {
    fn get(&self, source: &str, period: &ArchivePeriod) -> Result<Option<CacheEntry>, BulkError> {
        let entry_path = self.entry_path(source, period);
        if !entry_path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&entry_path).map_err(|e| BulkError::Cache(e.to_string()))?;

        let meta_raw = match fs::read_to_string(self.meta_path(source, period)) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    "Cache entry {} has no readable metadata ({}); treating as missing",
                    entry_path.display(),
                    e
                );
                return Ok(None);
            }
        };
        let meta: CacheMeta =
            serde_json::from_str(&meta_raw).map_err(|e| BulkError::Cache(e.to_string()))?;

        Ok(Some(CacheEntry {
            bytes,
            fetched_at: meta.fetched_at,
        }))
    }

    fn put(
        &self,
        source: &str,
        period: &ArchivePeriod,
        bytes: &[u8],
        fetched_at: DateTime<Utc>,
    ) -> Result<(), BulkError> {
        fs::create_dir_all(&self.root).map_err(|e| BulkError::Cache(e.to_string()))?;
        fs::write(self.entry_path(source, period), bytes)
            .map_err(|e| BulkError::Cache(e.to_string()))?;
        let meta = serde_json::to_string(&CacheMeta { fetched_at })
            .map_err(|e| BulkError::Cache(e.to_string()))?;
        fs::write(self.meta_path(source, period), meta)
            .map_err(|e| BulkError::Cache(e.to_string()))?;
        Ok(())
    }
}

/// In-memory cache used by tests and short-lived runs.
#[derive(Default)]
pub struct MemoryArchiveCache {
    entries: Mutex<HashMap<(String, String), CacheEntry>>,
}

impl MemoryArchiveCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArchiveCache for MemoryArchiveCache {
    fn get(&self, source: &str, period: &ArchivePeriod) -> Result<Option<CacheEntry>, BulkError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| BulkError::Cache(e.to_string()))?;
        Ok(entries.get(&(source.to_string(), period.key())).cloned())
    }

    fn put(
        &self,
        source: &str,
        period: &ArchivePeriod,
        bytes: &[u8],
        fetched_at: DateTime<Utc>,
    ) -> Result<(), BulkError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| BulkError::Cache(e.to_string()))?;
        entries.insert(
            (source.to_string(), period.key()),
            CacheEntry {
                bytes: bytes.to_vec(),
                fetched_at,
            },
        );
        Ok(())
    }
}

/// Mode for the caching wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Serve fresh cache entries, fetch the rest.
    CacheThenFetch,
    /// Ignore cache freshness and refetch everything (full rebuilds).
    ForceRefetch,
    /// Never touch the network; a cache miss is an error (CI mode).
    CacheOnly,
}

/// Caching decorator over any [`BulkArchiveSource`].
///
/// `now` is fixed at construction so one build run applies one consistent
/// staleness horizon.
pub struct CachedArchiveSource {
    inner: Arc<dyn BulkArchiveSource>,
    cache: Arc<dyn ArchiveCache>,
    policy: CachePolicy,
    source_name: String,
    mode: FetchMode,
    now: DateTime<Utc>,
}

impl CachedArchiveSource {
    pub fn new(
        inner: Arc<dyn BulkArchiveSource>,
        cache: Arc<dyn ArchiveCache>,
        policy: CachePolicy,
        source_name: impl Into<String>,
        mode: FetchMode,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            inner,
            cache,
            policy,
            source_name: source_name.into(),
            mode,
            now,
        }
    }
}

#[async_trait]
impl BulkArchiveSource for CachedArchiveSource {
    async fn fetch_archive(&self, period: &ArchivePeriod) -> Result<Vec<u8>, BulkError> {
        if self.mode != FetchMode::ForceRefetch {
            if let Some(entry) = self.cache.get(&self.source_name, period)? {
                if self.mode == FetchMode::CacheOnly
                    || self.policy.is_fresh(period, entry.fetched_at, self.now)
                {
                    debug!("Cache hit for {} {}", self.source_name, period);
                    return Ok(entry.bytes);
                }
            }
        }

        if self.mode == FetchMode::CacheOnly {
            return Err(BulkError::Unavailable(format!(
                "no cached archive for {} {} in cache-only mode",
                self.source_name, period
            )));
        }

        let bytes = self.inner.fetch_archive(period).await?;
        self.cache
            .put(&self.source_name, period, &bytes, self.now)?;
        Ok(bytes)
    }
}
