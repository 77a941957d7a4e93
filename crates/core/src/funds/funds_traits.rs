//! Repository and service traits for the fund registry.

use async_trait::async_trait;

use super::funds_model::{Fund, FundRegistry};
use crate::errors::Result;

/// Persistence interface for the fund registry artifact.
#[async_trait]
pub trait FundRepositoryTrait: Send + Sync {
    /// Loads every registry entry, ordered by fund id.
    fn load_all(&self) -> Result<Vec<Fund>>;

    /// Replaces the whole registry artifact in one transaction.
    /// Returns the number of entries written.
    async fn replace_all(&self, funds: Vec<Fund>) -> Result<usize>;
}

/// Read interface used by the reconciliation pipeline and the query surface.
#[async_trait]
pub trait FundServiceTrait: Send + Sync {
    fn get_registry(&self) -> Result<FundRegistry>;

    async fn save_registry(&self, funds: Vec<Fund>) -> Result<usize>;
}
