use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::catalog::{JsonFileStorage, Library, Opened};
use crate::config::Settings;
use crate::cover::{CoverProbe, HttpFetcher};

mod event_loop;
mod logging;
mod settings;


pub use logging::{LogTarget, init_logging};
pub use settings::load_settings;

/// Open the library file named by `settings`. A load failure leaves the
/// library empty; the returned line describes the outcome either way.
pub fn open_library(settings: &Settings) -> (Library, String) {
    let storage = JsonFileStorage::new(&settings.library.path);
    let Opened { library, load } = Library::open(Box::new(storage), settings.library.autosave);

    let summary = match load {
        Ok(report) => {
            for skipped in &report.skipped {
                warn!("skipped entry {}: {}", skipped.position, skipped.reason);
            }
            info!("loaded {} tracks from {}", report.loaded, library.location());
            if report.skipped.is_empty() {
                format!("Loaded {} tracks", report.loaded)
            } else {
                format!(
                    "Loaded {} tracks, skipped {} malformed entries",
                    report.loaded,
                    report.skipped.len()
                )
            }
        }
        Err(e) if library.load_failure().is_some() => {
            warn!("starting with an empty library, saving disabled until it reloads: {e}");
            format!("Error: {e} (saving disabled, fix the file and press R)")
        }
        Err(e) => {
            warn!("starting with an empty library: {e}");
            format!("Error: {e}")
        }
    };
    (library, summary)
}

fn spawn_covers(settings: &Settings) -> Option<CoverProbe> {
    if !settings.covers.enabled {
        return None;
    }
    match HttpFetcher::new(&settings.covers) {
        Ok(fetcher) => Some(CoverProbe::spawn(fetcher)),
        Err(e) => {
            warn!("cover probing disabled: {e}");
            None
        }
    }
}

/// Run the full-screen interface until the user quits.
pub fn run_tui(settings: &Settings, library: &mut Library, status: String) -> anyhow::Result<()> {
    let mut app = App::new(library.catalog());
    app.status = status;

    let covers = spawn_covers(settings);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: anyhow::Result<()> = (|| {
        let mut state = event_loop::EventLoopState::new(covers);
        event_loop::run(&mut terminal, settings, library, &mut app, &mut state)
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}
