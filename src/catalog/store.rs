use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use super::error::{CatalogError, CatalogResult};
use super::key::TrackKey;
use super::record::{TrackRecord, validate_rating};
use super::rows::{ImportMode, ImportReport, RawRow, TrackRow};
use super::storage::CatalogStorage;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum CatalogState {
    #[default]
    Empty,
    Loaded,
}

/// An entry that was dropped while loading or importing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// 1-based position in the source (array entry or CSV row).
    pub position: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<Skipped>,
}

/// The in-memory track catalog.
///
/// Records are kept in load order and addressed by their positional
/// [`TrackKey`]. Callers only ever get shared borrows or copies out of it.
#[derive(Debug, Default)]
pub struct TrackCatalog {
    records: Vec<TrackRecord>,
    state: CatalogState,
}

impl TrackCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CatalogState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace the catalog with the entries read from `source`.
    ///
    /// Malformed entries are dropped and listed in the report. When the source
    /// itself cannot be read the catalog is left empty and the error returned.
    pub fn load(&mut self, source: &dyn CatalogStorage) -> CatalogResult<LoadReport> {
        let entries = match source.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("failed to load {}: {e}", source.location());
                self.records.clear();
                self.state = CatalogState::Empty;
                return Err(e);
            }
        };

        let mut records = Vec::with_capacity(entries.len());
        let mut skipped = Vec::new();
        for (i, entry) in entries.into_iter().enumerate() {
            match TrackRecord::from_json(entry) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("skipping entry {} of {}: {e}", i + 1, source.location());
                    skipped.push(Skipped {
                        position: i + 1,
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Swap in the fully built set; nothing observes a partial load.
        self.records = records;
        self.state = CatalogState::Loaded;
        info!(
            "loaded {} tracks from {} ({} skipped)",
            self.records.len(),
            source.location(),
            skipped.len()
        );

        Ok(LoadReport {
            loaded: self.records.len(),
            skipped,
        })
    }

    /// Write every record, in key order, to `destination`.
    pub fn save(&self, destination: &dyn CatalogStorage) -> CatalogResult<()> {
        let entries = self
            .records
            .iter()
            .map(TrackRecord::to_json)
            .collect::<CatalogResult<Vec<_>>>()?;
        destination.write_entries(&entries)?;
        info!("saved {} tracks to {}", entries.len(), destination.location());
        Ok(())
    }

    pub fn list_all(&self) -> Vec<(TrackKey, &TrackRecord)> {
        self.entries().collect()
    }

    /// Records whose singer contains `artist` (case-sensitive). No match is an
    /// empty list.
    pub fn list_by_artist(&self, artist: &str) -> Vec<(TrackKey, &TrackRecord)> {
        self.entries()
            .filter(|(_, r)| r.singer().contains(artist))
            .collect()
    }

    pub fn get(&self, key: TrackKey) -> Option<&TrackRecord> {
        self.records.get(key.index())
    }

    /// Distinct singer names, sorted.
    pub fn artists(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(TrackRecord::singer)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Set the rating of `key`, returning the previous rating.
    pub fn set_rating(&mut self, key: TrackKey, rating: i64) -> CatalogResult<u8> {
        let rating = validate_rating(rating)?;
        let record = self.get_mut(key)?;
        let old = record.set_rating(rating);
        debug!("rating of {key} changed {old} -> {rating}");
        Ok(old)
    }

    /// Count one play of `key`, returning the new play count.
    pub fn record_play(&mut self, key: TrackKey) -> CatalogResult<u64> {
        let record = self.get_mut(key)?;
        let count = record.increment_play_count();
        debug!("play count of {key} is now {count}");
        Ok(count)
    }

    /// Append `record`, returning its key.
    pub fn add(&mut self, record: TrackRecord) -> TrackKey {
        self.records.push(record);
        self.state = CatalogState::Loaded;
        TrackKey::from_index(self.records.len() - 1)
    }

    /// Add tabular rows (Song, Artist, Rating, Play Count).
    ///
    /// Rows that fail validation are skipped and reported; the rest of the
    /// batch is still applied.
    pub fn import_rows<I, R>(&mut self, rows: I, mode: ImportMode) -> ImportReport
    where
        I: IntoIterator<Item = R>,
        R: RawRow,
    {
        let mut report = ImportReport::default();
        for (i, row) in rows.into_iter().enumerate() {
            let parsed = row
                .fields()
                .map_err(|reason| CatalogError::validation("row", reason))
                .and_then(TrackRow::parse);
            let outcome = parsed.and_then(|row| self.apply_row(row, mode));
            match outcome {
                Ok(RowOutcome::Appended) => report.appended += 1,
                Ok(RowOutcome::Merged) => report.merged += 1,
                Err(e) => {
                    warn!("skipping import row {}: {e}", i + 1);
                    report.skipped.push(Skipped {
                        position: i + 1,
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(
            "imported rows: {} appended, {} merged, {} skipped",
            report.appended,
            report.merged,
            report.skipped.len()
        );
        report
    }

    /// Rows for the records matching `predicate`, in key order.
    pub fn export_filtered<F>(&self, predicate: F) -> Vec<TrackRow>
    where
        F: Fn(&TrackRecord) -> bool,
    {
        self.records
            .iter()
            .filter(|r| predicate(r))
            .map(TrackRow::from_record)
            .collect()
    }

    fn entries(&self) -> impl Iterator<Item = (TrackKey, &TrackRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (TrackKey::from_index(i), r))
    }

    fn get_mut(&mut self, key: TrackKey) -> CatalogResult<&mut TrackRecord> {
        self.records
            .get_mut(key.index())
            .ok_or_else(|| CatalogError::NotFound(key.to_string()))
    }

    fn apply_row(&mut self, row: TrackRow, mode: ImportMode) -> CatalogResult<RowOutcome> {
        if mode == ImportMode::Merge {
            if let Some(existing) = self
                .records
                .iter_mut()
                .find(|r| r.title() == row.title && r.singer() == row.artist)
            {
                existing.set_rating(row.rating);
                existing.set_play_count(row.play_count);
                return Ok(RowOutcome::Merged);
            }
        }

        let mut record = TrackRecord::new(row.title, row.artist, i64::from(row.rating), "")?;
        record.set_play_count(row.play_count);
        self.add(record);
        Ok(RowOutcome::Appended)
    }
}

enum RowOutcome {
    Appended,
    Merged,
}

/// Export predicate for tracks that have been played at least once.
pub fn played(record: &TrackRecord) -> bool {
    record.play_count() > 0
}
