use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by catalog operations.
///
/// `Validation` and `NotFound` are local conditions meant for the user.
/// `Storage` means the backing file could not be read or written; the
/// in-memory catalog is still consistent when it is returned.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("track {0} not found")]
    NotFound(String),

    #[error("storage error on {}: {reason}", path.display())]
    Storage { path: PathBuf, reason: String },
}

impl CatalogError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn storage(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Storage {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
