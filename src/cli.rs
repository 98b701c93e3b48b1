//! Command line surface.
//!
//! With no subcommand the program starts the TUI. The other subcommands run
//! one library operation headless and print the result.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use crate::catalog::{CatalogError, ImportMode, Library, TrackKey, TrackRecord};
use crate::config::Settings;
use crate::runtime::LogTarget;


#[derive(Parser, Debug)]
#[command(name = "jukebox", version, about = "Track library with ratings and play counts")]
pub struct Cli {
    /// Library JSON file; overrides `library.path` from the config.
    #[arg(long, global = true)]
    pub library: Option<PathBuf>,

    /// Config file; overrides `JUKEBOX_CONFIG_PATH` and the XDG location.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn log_target(&self) -> LogTarget {
        match self.command {
            None | Some(Command::Tui) => LogTarget::Tui,
            Some(_) => LogTarget::Stderr,
        }
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the terminal interface (the default).
    Tui,

    /// Print the effective settings as TOML.
    PrintConfig,

    #[command(flatten)]
    Library(LibraryCommand),
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum LibraryCommand {
    /// List tracks, optionally only those whose singer contains ARTIST.
    List {
        #[arg(long)]
        artist: Option<String>,
    },

    /// Show every field of one track.
    Show { key: String },

    /// Count one play of a track.
    Play { key: String },

    /// Set the rating (0-5) of a track.
    Rate {
        key: String,
        #[arg(allow_negative_numbers = true)]
        rating: i64,
    },

    /// Append a new track.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        singer: String,
        #[arg(long, allow_negative_numbers = true)]
        rating: i64,
        #[arg(long)]
        link: String,
        #[arg(long)]
        image_url: Option<String>,
    },

    /// Import rows from a CSV file (Song, Artist, Rating, Play Count).
    Import {
        file: PathBuf,
        /// The first line is data, not a header.
        #[arg(long)]
        no_header: bool,
        /// Update tracks with the same title and singer instead of appending.
        #[arg(long)]
        merge: bool,
    },

    /// Export tracks to CSV. Only played tracks unless `--all` is given.
    Export {
        file: PathBuf,
        #[arg(long)]
        all: bool,
    },
}

fn parse_key(raw: &str) -> Result<TrackKey, CatalogError> {
    raw.parse::<TrackKey>()
}

fn lookup<'a>(library: &'a Library, raw: &str) -> Result<(TrackKey, &'a TrackRecord), CatalogError> {
    let key = parse_key(raw)?;
    let record = library
        .catalog()
        .get(key)
        .ok_or_else(|| CatalogError::NotFound(raw.to_string()))?;
    Ok((key, record))
}

/// Without autosave a headless mutation would be lost on exit.
fn flush(library: &Library) -> anyhow::Result<()> {
    if !library.autosave() {
        library
            .save()
            .with_context(|| format!("saving {}", library.location()))?;
    }
    Ok(())
}

/// Run one library subcommand, writing its report to `out`.
pub fn execute<W: Write>(
    command: LibraryCommand,
    settings: &Settings,
    library: &mut Library,
    out: &mut W,
) -> anyhow::Result<()> {
    if let Some(reason) = library.load_failure() {
        bail!("cannot use {}: {reason}", library.location());
    }

    match command {
        LibraryCommand::List { artist } => {
            let tracks = match artist.as_deref() {
                Some(artist) => library.catalog().list_by_artist(artist),
                None => library.catalog().list_all(),
            };
            if tracks.is_empty() {
                match artist {
                    Some(artist) => writeln!(out, "No tracks found for {artist}")?,
                    None => writeln!(out, "No tracks found")?,
                }
            }
            for (key, record) in tracks {
                writeln!(
                    out,
                    "{}: {} by {} (rating {}, plays {})",
                    key,
                    record.title(),
                    record.singer(),
                    record.rating(),
                    record.play_count()
                )?;
            }
        }
        LibraryCommand::Show { key } => {
            let (key, record) = lookup(library, &key)?;
            writeln!(out, "Key: {key}")?;
            writeln!(out, "Song: {}", record.title())?;
            writeln!(out, "Singer: {}", record.singer())?;
            writeln!(out, "Rating: {}", record.rating())?;
            writeln!(out, "Plays: {}", record.play_count())?;
            writeln!(out, "Link: {}", record.link())?;
            if let Some(url) = record.image_url() {
                writeln!(out, "Cover: {url}")?;
            }
            for (name, value) in record.extra() {
                writeln!(out, "{name}: {value}")?;
            }
        }
        LibraryCommand::Play { key } => {
            let (key, _) = lookup(library, &key)?;
            let count = library.play(key)?;
            flush(library)?;
            if let Some(record) = library.catalog().get(key) {
                writeln!(
                    out,
                    "Playing {}: {} by {} (plays: {})",
                    key,
                    record.title(),
                    record.singer(),
                    count
                )?;
            }
        }
        LibraryCommand::Rate { key, rating } => {
            let key = parse_key(&key)?;
            let old = library.rate(key, rating)?;
            flush(library)?;
            writeln!(out, "Rated {key}: {old} -> {rating}")?;
        }
        LibraryCommand::Add {
            title,
            singer,
            rating,
            link,
            image_url,
        } => {
            let mut record = TrackRecord::new(title, singer, rating, link)?;
            if let Some(url) = image_url {
                record = record.with_image_url(url);
            }
            let key = library.add(record)?;
            flush(library)?;
            writeln!(out, "Added {key}")?;
        }
        LibraryCommand::Import {
            file,
            no_header,
            merge,
        } => {
            let has_header = settings.interchange.import_has_header && !no_header;
            let mode = if merge {
                ImportMode::Merge
            } else {
                settings.interchange.import_mode
            };
            let imported = library.import_csv(&file, has_header, mode)?;
            for skipped in &imported.report.skipped {
                writeln!(out, "row {}: {}", skipped.position, skipped.reason)?;
            }
            writeln!(out, "Imported {}: {}", file.display(), imported.report.summary())?;
            imported
                .saved
                .with_context(|| format!("saving {}", library.location()))?;
            flush(library)?;
        }
        LibraryCommand::Export { file, all } => {
            let n = if all {
                library.export_csv(&file, |_| true)?
            } else {
                library.export_played_csv(&file)?
            };
            writeln!(out, "Exported {n} tracks to {}", file.display())?;
        }
    }
    Ok(())
}
