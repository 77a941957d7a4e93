//! Query module - the read-only surface consumed by the presentation layer.

pub mod query_service;

pub use query_service::*;
