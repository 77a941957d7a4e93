//! Fund registry artifact storage.

pub mod model;
pub mod repository;

pub use model::*;
pub use repository::*;
