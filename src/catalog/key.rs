use std::fmt;
use std::str::FromStr;

use super::error::CatalogError;

/// Positional track identifier: the 1-based load position, zero-padded to at
/// least two digits.
///
/// Keys are derived every time the catalog is loaded and are never written to
/// storage, so a key only names the same record until the file is reordered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackKey(usize);

impl TrackKey {
    /// Key for the record at zero-based `index` in catalog order.
    pub fn from_index(index: usize) -> Self {
        Self(index + 1)
    }

    pub fn index(self) -> usize {
        self.0 - 1
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl FromStr for TrackKey {
    type Err = CatalogError;

    /// Accepts any all-digit input naming a position >= 1, so "2", "02" and
    /// "002" all parse to the same key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CatalogError::NotFound(s.to_string()));
        }
        match s.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(Self(n)),
            _ => Err(CatalogError::NotFound(s.to_string())),
        }
    }
}
