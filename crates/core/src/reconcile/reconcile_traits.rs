//! Repository trait for the consolidated snapshot artifact.

use async_trait::async_trait;

use super::reconcile_model::PositionRecord;
use crate::errors::Result;

/// Persistence interface for the consolidated table.
///
/// Each build run replaces the whole artifact; readers only ever see a
/// fully published snapshot.
#[async_trait]
pub trait ConsolidatedRepositoryTrait: Send + Sync {
    /// Loads the whole consolidated table ordered by (fund, date, asset).
    fn load_all(&self) -> Result<Vec<PositionRecord>>;

    /// Number of persisted rows.
    fn count(&self) -> Result<i64>;

    /// Atomically replaces the snapshot artifact. Returns the number of
    /// rows written.
    async fn replace_all(&self, records: Vec<PositionRecord>) -> Result<usize>;
}
