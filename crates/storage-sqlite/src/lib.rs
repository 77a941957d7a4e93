//! SQLite storage implementation for fundlens.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the repository traits defined in
//! `fundlens-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for the snapshot and registry artifacts
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel
//! dependencies exist. The core crate is database-agnostic and works with
//! traits.
//!
//! ```text
//! core (domain)
//!       │
//!       ▼
//! storage-sqlite (this crate)
//!       │
//!       ▼
//!   SQLite DB
//! ```

pub mod consolidated;
pub mod db;
pub mod errors;
pub mod funds;
pub mod schema;

// Re-export database utilities
pub use db::{create_pool, get_connection, init, run_migrations, DbConnection, DbPool};

// Re-export storage errors and conversion helpers
pub use errors::StorageError;

// Re-export from fundlens-core for convenience
pub use fundlens_core::errors::{DatabaseError, Error, Result};
