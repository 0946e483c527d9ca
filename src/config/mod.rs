//! Configuration module for skinsheet projects
//!
//! Provides types and parsing for `skinsheet.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
