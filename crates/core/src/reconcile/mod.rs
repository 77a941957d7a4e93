//! Reconciliation module - collapses multi-source filings into the
//! consolidated position table.

pub mod engine;
pub mod reconcile_model;
pub mod reconcile_traits;

pub use engine::*;
pub use reconcile_model::*;
pub use reconcile_traits::*;
