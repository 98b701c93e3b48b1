//! Track catalog: validated records, positional keys and JSON persistence.
//!
//! `TrackCatalog` is the in-memory store. `Library` binds one catalog to its
//! storage file and is the only object the rest of the program mutates.

mod error;
mod key;
mod library;
mod record;
mod rows;
mod storage;
mod store;

pub use error::CatalogError;
pub use key::TrackKey;
pub use library::{Imported, Library, Opened};
pub use record::{MAX_RATING, TrackRecord};
pub use rows::ImportMode;
pub use storage::JsonFileStorage;
pub use store::{CatalogState, TrackCatalog};

#[cfg(test)]
mod tests;
