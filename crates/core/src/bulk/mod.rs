//! Bulk source module - regulator archive download, extraction, and caching.
//!
//! The regulator publishes one zip archive per calendar month. Fetching is
//! hidden behind [`BulkArchiveSource`] so the pipeline can run against the
//! HTTP source, a cache-only source (CI mode), or a deterministic fake in
//! tests. Caching is an explicit, injectable collaborator, never hidden
//! global state.

pub mod archive;
pub mod bulk_cache;
pub mod bulk_errors;
pub mod bulk_source;

pub use archive::*;
pub use bulk_cache::*;
pub use bulk_errors::*;
pub use bulk_source::*;
