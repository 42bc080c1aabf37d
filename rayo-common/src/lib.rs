//! # Rayo Common Library
//!
//! Shared code for the Rayo content-operations backend:
//! - Error types
//! - Configuration and data directory resolution
//! - Database initialization, migrations and row models
//! - Blog document versioning core
//! - Timezone helpers (UTC storage, IST presentation)

pub mod config;
pub mod db;
pub mod error;
pub mod time;
pub mod versioning;

pub use error::{Error, Result};
