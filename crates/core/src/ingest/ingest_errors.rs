//! Ingestion error types.

use thiserror::Error;

/// Errors raised while normalizing a raw disclosure document.
///
/// These never abort a batch: the public parser entry points downgrade
/// them to `None` and the document is skipped.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Unsupported document layout: {0}")]
    UnsupportedLayout(String),

    #[error("Text decoding failed: {0}")]
    Encoding(String),
}
