//! Application model types: `App` and `InputMode`.
//!
//! The `App` struct holds view state only (selection, artist filter, play
//! queue, prompts, status line). Track data stays in the `Library`, which is
//! passed in by reference for every action that reads or mutates it.

use std::path::PathBuf;

use crate::catalog::{Imported, Library, TrackCatalog, TrackKey, TrackRecord};
use crate::config::InterchangeSettings;

/// What keystrokes currently edit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing an artist substring.
    Filter,
    /// Typing a file path for an import or export.
    Prompt(PromptKind),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PromptKind {
    Import,
    Export,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::Import => "import CSV from",
            PromptKind::Export => "export played tracks to",
        }
    }
}

/// The main application model.
#[derive(Debug, Default)]
pub struct App {
    pub selected: Option<TrackKey>,
    pub input: InputMode,
    pub artist_filter: String,
    pub prompt: String,
    pub queue: Vec<TrackKey>,
    /// Track whose details popup is open.
    pub details: Option<TrackKey>,
    pub status: String,
    artist_cursor: Option<usize>,
}

impl App {
    /// Create a new `App` positioned on the first track of `catalog`.
    pub fn new(catalog: &TrackCatalog) -> Self {
        let mut app = Self::default();
        app.ensure_selected_visible(catalog);
        app
    }

    /// The tracks currently listed, in key order.
    pub fn visible<'a>(&self, catalog: &'a TrackCatalog) -> Vec<(TrackKey, &'a TrackRecord)> {
        if self.artist_filter.is_empty() {
            catalog.list_all()
        } else {
            catalog.list_by_artist(&self.artist_filter)
        }
    }

    fn visible_keys(&self, catalog: &TrackCatalog) -> Vec<TrackKey> {
        self.visible(catalog).into_iter().map(|(k, _)| k).collect()
    }

    /// Ensure that `selected` is part of the current filtered view,
    /// otherwise move selection to the first visible track.
    pub fn ensure_selected_visible(&mut self, catalog: &TrackCatalog) {
        let keys = self.visible_keys(catalog);
        match self.selected {
            Some(k) if keys.contains(&k) => {}
            _ => self.selected = keys.first().copied(),
        }
    }

    /// Move selection to the next visible track, wrapping around.
    pub fn next(&mut self, catalog: &TrackCatalog) {
        let keys = self.visible_keys(catalog);
        if keys.is_empty() {
            self.selected = None;
            return;
        }
        let pos = self.selected.and_then(|s| keys.iter().position(|&k| k == s));
        self.selected = Some(match pos {
            Some(p) => keys[(p + 1) % keys.len()],
            None => keys[0],
        });
    }

    /// Move selection to the previous visible track, wrapping around.
    pub fn prev(&mut self, catalog: &TrackCatalog) {
        let keys = self.visible_keys(catalog);
        if keys.is_empty() {
            self.selected = None;
            return;
        }
        let pos = self.selected.and_then(|s| keys.iter().position(|&k| k == s));
        self.selected = Some(match pos {
            Some(0) | None => keys[keys.len() - 1],
            Some(p) => keys[p - 1],
        });
    }

    pub fn select_first(&mut self, catalog: &TrackCatalog) {
        self.selected = self.visible_keys(catalog).first().copied();
    }

    pub fn select_last(&mut self, catalog: &TrackCatalog) {
        self.selected = self.visible_keys(catalog).last().copied();
    }

    /// Enter filter mode: typed characters edit the artist filter.
    pub fn enter_filter_mode(&mut self) {
        self.input = InputMode::Filter;
    }

    pub fn exit_filter_mode(&mut self) {
        self.input = InputMode::Normal;
    }

    /// Clear the artist filter and restore selection visibility.
    pub fn clear_filter(&mut self, catalog: &TrackCatalog) {
        self.artist_filter.clear();
        self.artist_cursor = None;
        self.input = InputMode::Normal;
        self.ensure_selected_visible(catalog);
    }

    pub fn push_filter_char(&mut self, c: char, catalog: &TrackCatalog) {
        self.artist_filter.push(c);
        self.artist_cursor = None;
        self.ensure_selected_visible(catalog);
        self.report_empty_filter(catalog);
    }

    pub fn pop_filter_char(&mut self, catalog: &TrackCatalog) {
        self.artist_filter.pop();
        self.artist_cursor = None;
        self.ensure_selected_visible(catalog);
        self.report_empty_filter(catalog);
    }

    /// Filter by the next known artist; after the last one the filter is cleared.
    pub fn cycle_artist(&mut self, catalog: &TrackCatalog) {
        let artists = catalog.artists();
        let next = match self.artist_cursor {
            None => 0,
            Some(i) => i + 1,
        };
        match artists.get(next) {
            Some(artist) => {
                self.artist_filter = artist.to_string();
                self.artist_cursor = Some(next);
                self.status = format!("Showing tracks by {artist}");
            }
            None => {
                self.artist_filter.clear();
                self.artist_cursor = None;
                self.status = "Showing all artists".to_string();
            }
        }
        self.ensure_selected_visible(catalog);
    }

    fn report_empty_filter(&mut self, catalog: &TrackCatalog) {
        if !self.artist_filter.is_empty() && self.visible(catalog).is_empty() {
            self.status = format!("No tracks found for {}", self.artist_filter);
        }
    }

    /// Show the selected track's details. Opening details counts as a play.
    pub fn open_details(&mut self, library: &mut Library) -> Option<TrackKey> {
        let key = self.selected?;
        match library.play(key) {
            Ok(count) => {
                self.details = Some(key);
                self.status = format!("Playing {key} (plays: {count})");
                Some(key)
            }
            // A failed autosave still counted the play in memory.
            Err(e) if e.is_storage() => {
                self.details = Some(key);
                self.status = format!("Playing {key}, but saving failed: {e}");
                Some(key)
            }
            Err(e) => {
                self.status = format!("Error: {e}");
                None
            }
        }
    }

    pub fn close_details(&mut self) {
        self.details = None;
    }

    pub fn rate_selected(&mut self, library: &mut Library, rating: i64) {
        let Some(key) = self.selected else {
            self.status = "No track selected".to_string();
            return;
        };
        self.status = match library.rate(key, rating) {
            Ok(old) => format!("Rated {key}: {old} -> {rating}"),
            Err(e) => format!("Error: {e}"),
        };
    }

    pub fn enqueue_selected(&mut self, catalog: &TrackCatalog) {
        let Some(key) = self.selected else {
            self.status = "No track selected".to_string();
            return;
        };
        if let Some(record) = catalog.get(key) {
            self.queue.push(key);
            self.status = format!("Added: {} by {}", record.title(), record.singer());
        }
    }

    /// Play every queued track once, then clear the queue.
    pub fn play_queue(&mut self, library: &mut Library) {
        if self.queue.is_empty() {
            self.status = "Play queue is empty. Add tracks first.".to_string();
            return;
        }
        self.status = match library.play_all(&self.queue) {
            Ok(n) => {
                self.queue.clear();
                format!("Played {n} queued tracks")
            }
            Err(e) if e.is_storage() => {
                self.queue.clear();
                format!("Played queue, but saving failed: {e}")
            }
            Err(e) => format!("Error: {e}"),
        };
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.status = "Play queue cleared".to_string();
    }

    pub fn open_prompt(&mut self, kind: PromptKind) {
        self.input = InputMode::Prompt(kind);
        self.prompt.clear();
    }

    pub fn cancel_prompt(&mut self) {
        self.input = InputMode::Normal;
        self.prompt.clear();
        self.status = "Cancelled".to_string();
    }

    /// Run the import or export the prompt was opened for.
    pub fn submit_prompt(&mut self, library: &mut Library, interchange: &InterchangeSettings) {
        let InputMode::Prompt(kind) = self.input else {
            return;
        };
        self.input = InputMode::Normal;

        let raw = std::mem::take(&mut self.prompt);
        let raw = raw.trim();
        if raw.is_empty() {
            self.status = "Cancelled".to_string();
            return;
        }
        let path = PathBuf::from(raw);

        self.status = match kind {
            PromptKind::Import => {
                match library.import_csv(&path, interchange.import_has_header, interchange.import_mode)
                {
                    Ok(Imported {
                        report,
                        saved: Ok(()),
                    }) => format!("Imported {}: {}", path.display(), report.summary()),
                    Ok(Imported {
                        report,
                        saved: Err(e),
                    }) => format!(
                        "Imported {}: {}, but saving failed: {e}",
                        path.display(),
                        report.summary()
                    ),
                    Err(e) => format!("Import failed: {e}"),
                }
            }
            PromptKind::Export => match library.export_played_csv(&path) {
                Ok(n) => format!("Exported {n} tracks to {}", path.display()),
                Err(e) => format!("Export failed: {e}"),
            },
        };
        self.ensure_selected_visible(library.catalog());
    }

    pub fn save(&mut self, library: &Library) {
        self.status = match library.save() {
            Ok(()) => format!("Saved to {}", library.location()),
            Err(e) => format!("Error: {e}"),
        };
    }

    pub fn reload(&mut self, library: &mut Library) {
        self.status = match library.reload() {
            Ok(report) if report.skipped.is_empty() => format!("Reloaded {} tracks", report.loaded),
            Ok(report) => format!(
                "Reloaded {} tracks, skipped {} malformed entries",
                report.loaded,
                report.skipped.len()
            ),
            Err(e) => format!("Error: {e}"),
        };
        // Keys are positional and may now name different tracks.
        self.queue.clear();
        self.details = None;
        self.ensure_selected_visible(library.catalog());
    }
}
