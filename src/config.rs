//! Configuration loader and schema types.
//!
//! This module exposes the configuration schema (library location, CSV
//! interchange, cover probing, UI and logging) and helpers to load it.

mod load;
mod schema;

pub use schema::*;
