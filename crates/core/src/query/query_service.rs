//! Read-only snapshot loading with process-lifetime caching.

use log::debug;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::errors::{Error, Result};
use crate::funds::{Fund, FundRepositoryTrait};
use crate::reconcile::{ConsolidatedRepositoryTrait, PositionRecord};

/// The registry and consolidated table, loaded together. Handed out as an
/// `Arc` and never mutated: a later build run publishes a whole new
/// snapshot instead.
#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub funds: Vec<Fund>,
    pub records: Vec<PositionRecord>,
}

struct CachedLoad {
    loaded_at: Instant,
    snapshot: Arc<LoadedSnapshot>,
}

/// Serves `load_all()` to the presentation layer, re-reading storage only
/// after the invalidation window has passed.
pub struct SnapshotQueryService {
    funds: Arc<dyn FundRepositoryTrait>,
    consolidated: Arc<dyn ConsolidatedRepositoryTrait>,
    ttl: Duration,
    cache: RwLock<Option<CachedLoad>>,
}

impl SnapshotQueryService {
    pub fn new(
        funds: Arc<dyn FundRepositoryTrait>,
        consolidated: Arc<dyn ConsolidatedRepositoryTrait>,
        ttl: Duration,
    ) -> Self {
        Self {
            funds,
            consolidated,
            ttl,
            cache: RwLock::new(None),
        }
    }

    /// Loads the registry and the consolidated table.
    ///
    /// An empty consolidated table means no build has published a snapshot
    /// yet; that is the fatal `MissingSnapshot` case, never silently-empty
    /// data the caller could mistake for a valid empty portfolio.
    pub fn load_all(&self) -> Result<Arc<LoadedSnapshot>> {
        {
            let cache = self
                .cache
                .read()
                .map_err(|e| Error::Unexpected(e.to_string()))?;
            if let Some(cached) = cache.as_ref() {
                if cached.loaded_at.elapsed() <= self.ttl {
                    return Ok(cached.snapshot.clone());
                }
            }
        }

        let records = self.consolidated.load_all()?;
        if records.is_empty() {
            return Err(Error::MissingSnapshot(
                "consolidated table is empty; run a build first".to_string(),
            ));
        }
        let funds = self.funds.load_all()?;
        debug!(
            "Loaded snapshot: {} funds, {} consolidated rows",
            funds.len(),
            records.len()
        );

        let snapshot = Arc::new(LoadedSnapshot { funds, records });
        let mut cache = self
            .cache
            .write()
            .map_err(|e| Error::Unexpected(e.to_string()))?;
        *cache = Some(CachedLoad {
            loaded_at: Instant::now(),
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Drops the cached snapshot so the next `load_all` re-reads storage.
    pub fn invalidate(&self) {
        if let Ok(mut cache) = self.cache.write() {
            *cache = None;
        }
    }
}
