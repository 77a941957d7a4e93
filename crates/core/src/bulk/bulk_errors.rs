//! Bulk source error types.

use thiserror::Error;

/// Errors from the regulator bulk source and its cache.
///
/// The builder downgrades `Unavailable`/`Network` to "skip this month";
/// they are only fatal when nothing at all can be built.
#[derive(Error, Debug)]
pub enum BulkError {
    #[error("Bulk source unavailable: {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Cache error: {0}")]
    Cache(String),
}
