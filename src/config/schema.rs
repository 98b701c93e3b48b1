use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalog::ImportMode;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/jukebox/config.toml` or `~/.config/jukebox/config.toml`
///
/// Precedence (highest wins):
/// 1) Command line flags (`--library`)
/// 2) Environment variables (prefix `JUKEBOX__`, `__` as nested separator)
/// 3) Config file (if present)
/// 4) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub interchange: InterchangeSettings,
    pub covers: CoverSettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// The JSON library file.
    pub path: PathBuf,
    /// Save after every rating change, play, addition or import.
    pub autosave: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            path: super::load::default_library_path().unwrap_or_else(|| PathBuf::from("song.json")),
            autosave: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InterchangeSettings {
    /// Whether imported CSV files start with a `Song,Artist,Rating,Play Count` header.
    pub import_has_header: bool,
    /// `append` adds every row; `merge` updates tracks with the same title and singer.
    pub import_mode: ImportMode,
}

impl Default for InterchangeSettings {
    fn default() -> Self {
        Self {
            import_has_header: true,
            import_mode: ImportMode::Append,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CoverSettings {
    /// Probe cover image URLs when a track's details are opened.
    pub enabled: bool,
    /// Give up on a cover request after this many milliseconds.
    pub timeout_ms: u64,
    /// Stop reading a cover body after this many bytes.
    pub max_bytes: u64,
}

impl Default for CoverSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 5_000,
            max_bytes: 8 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ JukeBox ~ ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    pub level: String,
    /// Log file for the terminal UI. Without one the UI does not log.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
