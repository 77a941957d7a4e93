//! Fund registry module - fund identities and feeder/master links.

pub mod funds_model;
pub mod funds_service;
pub mod funds_traits;

pub use funds_model::*;
pub use funds_service::*;
pub use funds_traits::*;
