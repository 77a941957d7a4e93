//! Aggregation module - pivoted weight series, snapshots, and overlap
//! metrics over the consolidated table. Everything here is read-only.

pub mod aggregate_model;
pub mod aggregate_service;
pub mod overlap;

pub use aggregate_model::*;
pub use aggregate_service::*;
pub use overlap::*;

#[cfg(test)]
mod aggregate_service_tests;
