//! Tabular interchange: the (Song, Artist, Rating, Play Count) row shape and
//! its CSV reader/writer.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{CatalogError, CatalogResult};
use super::record::{TrackRecord, validate_play_count, validate_rating};
use super::store::Skipped;

pub const HEADER: [&str; 4] = ["Song", "Artist", "Rating", "Play Count"];

/// One validated interchange row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRow {
    pub title: String,
    pub artist: String,
    pub rating: u8,
    pub play_count: u64,
}

impl TrackRow {
    pub fn from_record(record: &TrackRecord) -> Self {
        Self {
            title: record.title().to_string(),
            artist: record.singer().to_string(),
            rating: record.rating(),
            play_count: record.play_count(),
        }
    }

    /// Validate a raw row: exactly four columns, integer rating in range and a
    /// non-negative integer play count.
    pub fn parse(fields: &[String]) -> CatalogResult<Self> {
        let [title, artist, rating, play_count] = fields else {
            return Err(CatalogError::validation(
                "row",
                format!("expected {} columns, found {}", HEADER.len(), fields.len()),
            ));
        };

        let rating = parse_int("rating", rating).and_then(validate_rating)?;
        let play_count = parse_int("play_count", play_count).and_then(validate_play_count)?;

        Ok(Self {
            title: title.trim().to_string(),
            artist: artist.trim().to_string(),
            rating,
            play_count,
        })
    }

    pub fn to_fields(&self) -> [String; 4] {
        [
            self.title.clone(),
            self.artist.clone(),
            self.rating.to_string(),
            self.play_count.to_string(),
        ]
    }
}

fn parse_int(field: &'static str, raw: &str) -> CatalogResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| CatalogError::validation(field, format!("{raw:?} is not an integer")))
}

/// How imported rows combine with the existing catalog.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportMode {
    /// Every valid row becomes a new record.
    #[default]
    Append,
    /// Rows matching an existing title and singer update its rating and play
    /// count; the others are appended.
    Merge,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub appended: usize,
    pub merged: usize,
    pub skipped: Vec<Skipped>,
}

impl ImportReport {
    pub fn summary(&self) -> String {
        format!(
            "{} added, {} updated, {} skipped",
            self.appended,
            self.merged,
            self.skipped.len()
        )
    }
}

/// The raw fields of one import row, or why the row could not be read.
pub trait RawRow {
    fn fields(&self) -> Result<&[String], String>;
}

impl RawRow for Vec<String> {
    fn fields(&self) -> Result<&[String], String> {
        Ok(self)
    }
}

impl RawRow for Result<Vec<String>, String> {
    fn fields(&self) -> Result<&[String], String> {
        self.as_deref().map_err(Clone::clone)
    }
}

impl<T: RawRow + ?Sized> RawRow for &T {
    fn fields(&self) -> Result<&[String], String> {
        (**self).fields()
    }
}

/// Read every CSV record as raw string fields.
///
/// Column counts are not enforced here so that short or long rows reach
/// [`TrackRow::parse`] and are reported one by one. A record that is not
/// valid UTF-8 comes back as an `Err` row for the same reason. With
/// `has_header` the first line is treated as a header and not returned.
pub fn read_csv<R: Read>(
    reader: R,
    has_header: bool,
) -> CatalogResult<Vec<Result<Vec<String>, String>>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .byte_records()
        .map(|record| {
            record
                .map(|r| decode_fields(&r))
                .map_err(|e| CatalogError::validation("csv", e.to_string()))
        })
        .collect()
}

fn decode_fields(record: &csv::ByteRecord) -> Result<Vec<String>, String> {
    record
        .iter()
        .enumerate()
        .map(|(i, field)| {
            String::from_utf8(field.to_vec())
                .map_err(|e| format!("column {} is not valid UTF-8: {e}", i + 1))
        })
        .collect()
}

/// Write `rows` as CSV, header first.
pub fn write_csv<W: Write>(writer: W, rows: &[TrackRow]) -> CatalogResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let to_err = |e: csv::Error| CatalogError::validation("csv", e.to_string());

    csv_writer.write_record(HEADER).map_err(to_err)?;
    for row in rows {
        csv_writer.write_record(row.to_fields()).map_err(to_err)?;
    }
    csv_writer
        .flush()
        .map_err(|e| CatalogError::validation("csv", e.to_string()))
}

pub fn read_csv_file(
    path: &Path,
    has_header: bool,
) -> CatalogResult<Vec<Result<Vec<String>, String>>> {
    let file = File::open(path).map_err(|e| CatalogError::storage(path, e))?;
    let rows = read_csv(file, has_header).map_err(|e| CatalogError::storage(path, e))?;
    debug!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn write_csv_file(path: &Path, rows: &[TrackRow]) -> CatalogResult<()> {
    let file = File::create(path).map_err(|e| CatalogError::storage(path, e))?;
    write_csv(file, rows).map_err(|e| CatalogError::storage(path, e))?;
    debug!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
