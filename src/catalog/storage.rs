use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use super::error::{CatalogError, CatalogResult};

/// Whole-file persistence for the catalog: entries are read all at once and
/// written all at once.
pub trait CatalogStorage {
    /// Read the raw entries. Fails when the source is missing, unreadable, not
    /// valid JSON, or not a JSON array.
    fn read_entries(&self) -> CatalogResult<Vec<Value>>;

    /// Replace the stored entries with `entries`.
    fn write_entries(&self, entries: &[Value]) -> CatalogResult<()>;

    /// Human readable location, used in logs and status messages.
    fn location(&self) -> String;

    /// Whether something is stored at the location. A source that exists but
    /// fails to read must not be overwritten.
    fn exists(&self) -> bool;
}

/// A JSON array of track objects on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogStorage for JsonFileStorage {
    fn read_entries(&self) -> CatalogResult<Vec<Value>> {
        let text =
            fs::read_to_string(&self.path).map_err(|e| CatalogError::storage(&self.path, e))?;
        let value: Value =
            serde_json::from_str(&text).map_err(|e| CatalogError::storage(&self.path, e))?;
        match value {
            Value::Array(entries) => {
                debug!("read {} entries from {}", entries.len(), self.path.display());
                Ok(entries)
            }
            other => Err(CatalogError::storage(
                &self.path,
                format!("expected a JSON array of tracks, found {}", json_kind(&other)),
            )),
        }
    }

    fn write_entries(&self, entries: &[Value]) -> CatalogResult<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| CatalogError::storage(&self.path, e))?;

        // Write next to the target and rename over it so a failed write never
        // leaves a truncated library behind.
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CatalogError::storage(&self.path, e))?;
        let text = to_pretty_json(entries).map_err(|e| CatalogError::storage(&self.path, e))?;
        tmp.write_all(text.as_bytes())
            .and_then(|_| tmp.flush())
            .map_err(|e| CatalogError::storage(&self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| CatalogError::storage(&self.path, e.error))?;

        debug!("wrote {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path().display().to_string()
    }

    fn exists(&self) -> bool {
        // An unknown answer counts as present.
        self.path.try_exists().unwrap_or(true)
    }
}

/// Pretty-print with 4-space indentation, the layout the library file has
/// always used.
fn to_pretty_json(entries: &[Value]) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    serde::Serialize::serialize(entries, &mut ser)?;
    buf.push(b'\n');
    // serde_json only emits valid UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
