//! Sector classification module - maps asset ids to sector labels.

pub mod sectors_model;
pub mod sectors_service;

pub use sectors_model::*;
pub use sectors_service::*;
