//! Database library providing a MongoDB connector and utilities.
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB connection management and health checks
//! - `config` - Configuration support with `core_config::FromEnv`
//!
//! # Example
//!
//! ```ignore
//! use database::mongodb;
//!
//! let client = mongodb::connect("mongodb://localhost:27017").await?;
//! let db = client.database("catalog");
//! let collection = db.collection::<Document>("products");
//! ```

// Always available modules
pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

// Re-exports for convenience
pub use common::{DatabaseError, DatabaseResult};
