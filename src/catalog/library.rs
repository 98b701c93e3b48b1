use std::path::Path;

use tracing::{info, warn};

use super::error::{CatalogError, CatalogResult};
use super::key::TrackKey;
use super::record::TrackRecord;
use super::rows::{self, ImportMode, ImportReport, RawRow, TrackRow};
use super::storage::CatalogStorage;
use super::store::{LoadReport, TrackCatalog, played};

/// The one catalog of a running program, bound to its storage.
///
/// Every surface (list view, details, play queue, CLI commands) mutates the
/// catalog through this type. With `autosave` on, each successful mutation is
/// followed by a save; a failed save keeps the mutation in memory and returns
/// the storage error so the caller can retry with [`Library::save`].
///
/// When the file exists but could not be loaded, saving is refused until a
/// reload succeeds, so the empty catalog never replaces the user's data.
pub struct Library {
    catalog: TrackCatalog,
    storage: Box<dyn CatalogStorage>,
    autosave: bool,
    load_failure: Option<String>,
}

/// Result of opening a library: the library is always usable, the load
/// outcome says whether it came up empty because the file was unreadable.
pub struct Opened {
    pub library: Library,
    pub load: CatalogResult<LoadReport>,
}

/// Result of an import: the rows applied in memory and the save that
/// followed. A failed save does not undo the rows.
#[derive(Debug)]
pub struct Imported {
    pub report: ImportReport,
    pub saved: CatalogResult<()>,
}

impl Library {
    pub fn open(storage: Box<dyn CatalogStorage>, autosave: bool) -> Opened {
        let mut catalog = TrackCatalog::new();
        let load = catalog.load(storage.as_ref());
        let load_failure = failure_of(&load, storage.as_ref());
        Opened {
            library: Self {
                catalog,
                storage,
                autosave,
                load_failure,
            },
            load,
        }
    }

    pub fn catalog(&self) -> &TrackCatalog {
        &self.catalog
    }

    pub fn location(&self) -> String {
        self.storage.location()
    }

    pub fn autosave(&self) -> bool {
        self.autosave
    }

    /// Why the library file could not be loaded, while that blocks saving.
    pub fn load_failure(&self) -> Option<&str> {
        self.load_failure.as_deref()
    }

    pub fn reload(&mut self) -> CatalogResult<LoadReport> {
        let load = self.catalog.load(self.storage.as_ref());
        self.load_failure = failure_of(&load, self.storage.as_ref());
        load
    }

    pub fn save(&self) -> CatalogResult<()> {
        if let Some(reason) = &self.load_failure {
            return Err(CatalogError::storage(
                self.location(),
                format!("not overwriting a library that failed to load ({reason})"),
            ));
        }
        self.catalog.save(self.storage.as_ref())
    }

    /// Count a play of `key`. Every "play" action in the program ends here.
    pub fn play(&mut self, key: TrackKey) -> CatalogResult<u64> {
        let count = self.catalog.record_play(key)?;
        self.persist()?;
        Ok(count)
    }

    /// Count a play of each key in order. Nothing is counted if any key is
    /// unknown.
    pub fn play_all(&mut self, keys: &[TrackKey]) -> CatalogResult<usize> {
        if let Some(missing) = keys.iter().find(|k| self.catalog.get(**k).is_none()) {
            return Err(CatalogError::NotFound(missing.to_string()));
        }
        for key in keys {
            self.catalog.record_play(*key)?;
        }
        self.persist()?;
        Ok(keys.len())
    }

    pub fn rate(&mut self, key: TrackKey, rating: i64) -> CatalogResult<u8> {
        let old = self.catalog.set_rating(key, rating)?;
        self.persist()?;
        Ok(old)
    }

    pub fn add(&mut self, record: TrackRecord) -> CatalogResult<TrackKey> {
        let key = self.catalog.add(record);
        self.persist()?;
        Ok(key)
    }

    pub fn import_rows<I, R>(&mut self, rows: I, mode: ImportMode) -> Imported
    where
        I: IntoIterator<Item = R>,
        R: RawRow,
    {
        let report = self.catalog.import_rows(rows, mode);
        let saved = if report.appended + report.merged > 0 {
            self.persist()
        } else {
            Ok(())
        };
        Imported { report, saved }
    }

    /// Import a CSV file. Only an unreadable file is an error; a failed save
    /// is carried in [`Imported::saved`].
    pub fn import_csv(
        &mut self,
        path: &Path,
        has_header: bool,
        mode: ImportMode,
    ) -> CatalogResult<Imported> {
        let rows = rows::read_csv_file(path, has_header)?;
        let imported = self.import_rows(&rows, mode);
        info!("imported {}: {}", path.display(), imported.report.summary());
        Ok(imported)
    }

    /// Export the tracks that have been played at least once.
    pub fn export_played_csv(&self, path: &Path) -> CatalogResult<usize> {
        self.export_csv(path, played)
    }

    pub fn export_csv<F>(&self, path: &Path, predicate: F) -> CatalogResult<usize>
    where
        F: Fn(&TrackRecord) -> bool,
    {
        let rows: Vec<TrackRow> = self.catalog.export_filtered(predicate);
        rows::write_csv_file(path, &rows)?;
        info!("exported {} rows to {}", rows.len(), path.display());
        Ok(rows.len())
    }

    fn persist(&self) -> CatalogResult<()> {
        if !self.autosave {
            return Ok(());
        }
        self.save().inspect_err(|e| {
            warn!("autosave failed, changes are kept in memory: {e}");
        })
    }
}

/// A load error blocks saving unless nothing was stored yet.
fn failure_of(load: &CatalogResult<LoadReport>, storage: &dyn CatalogStorage) -> Option<String> {
    match load {
        Err(e) if storage.exists() => Some(e.to_string()),
        _ => None,
    }
}
