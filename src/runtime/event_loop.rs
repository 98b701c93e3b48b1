use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, InputMode, PromptKind};
use crate::catalog::Library;
use crate::config;
use crate::cover::{CoverProbe, CoverStatus};
use crate::ui;

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// Cover worker; `None` when covers are disabled.
    covers: Option<CoverProbe>,
}

impl EventLoopState {
    pub fn new(covers: Option<CoverProbe>) -> Self {
        Self {
            pending_gg: false,
            covers,
        }
    }

    fn cover_status(&self) -> CoverStatus {
        self.covers
            .as_ref()
            .map(CoverProbe::status)
            .unwrap_or_default()
    }

    fn request_cover(&mut self, url: Option<&str>) {
        if let Some(probe) = self.covers.as_mut() {
            match url {
                Some(url) => probe.request(url),
                None => probe.cancel(),
            }
        }
    }

    fn cancel_cover(&mut self) {
        if let Some(probe) = self.covers.as_mut() {
            probe.cancel();
        }
    }
}

/// Main terminal event loop: handles input and UI drawing. Returns `Ok(())`
/// when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    library: &mut Library,
    app: &mut App,
    state: &mut EventLoopState,
) -> anyhow::Result<()> {
    let location = library.location();
    loop {
        let cover = state.cover_status();
        terminal.draw(|f| {
            ui::draw(
                f,
                app,
                library.catalog(),
                &location,
                &cover,
                &settings.ui,
            )
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, library, app, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Apply one key press. Returns `true` when the user asked to quit.
pub(crate) fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    library: &mut Library,
    app: &mut App,
    state: &mut EventLoopState,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    match app.input {
        InputMode::Filter => {
            state.pending_gg = false;
            handle_filter_key(key, library, app);
            false
        }
        InputMode::Prompt(_) => {
            state.pending_gg = false;
            handle_prompt_key(key, settings, library, app);
            false
        }
        InputMode::Normal => handle_normal_key(key, library, app, state),
    }
}

fn handle_filter_key(key: KeyEvent, library: &Library, app: &mut App) {
    let catalog = library.catalog();
    match key.code {
        KeyCode::Esc => app.clear_filter(catalog),
        KeyCode::Enter => app.exit_filter_mode(),
        KeyCode::Backspace => app.pop_filter_char(catalog),
        KeyCode::Down => app.next(catalog),
        KeyCode::Up => app.prev(catalog),
        KeyCode::Char(c) if !c.is_control() => app.push_filter_char(c, catalog),
        _ => {}
    }
}

fn handle_prompt_key(
    key: KeyEvent,
    settings: &config::Settings,
    library: &mut Library,
    app: &mut App,
) {
    match key.code {
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Enter => app.submit_prompt(library, &settings.interchange),
        KeyCode::Backspace => {
            app.prompt.pop();
        }
        KeyCode::Char(c) if !c.is_control() => app.prompt.push(c),
        _ => {}
    }
}

fn handle_normal_key(
    key: KeyEvent,
    library: &mut Library,
    app: &mut App,
    state: &mut EventLoopState,
) -> bool {
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Char('a') => app.cycle_artist(library.catalog()),
        KeyCode::Esc => {
            if app.details.is_some() {
                app.close_details();
                state.cancel_cover();
            } else {
                app.clear_filter(library.catalog());
            }
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.select_first(library.catalog());
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.select_last(library.catalog()),
        KeyCode::Char('j') | KeyCode::Down => app.next(library.catalog()),
        KeyCode::Char('k') | KeyCode::Up => app.prev(library.catalog()),
        KeyCode::Enter => {
            if let Some(track) = app.open_details(library) {
                let url = library.catalog().get(track).and_then(|r| r.image_url());
                state.request_cover(url);
            }
        }
        KeyCode::Char('K') => {
            app.close_details();
            state.cancel_cover();
        }
        KeyCode::Char(c @ '0'..='5') => {
            let rating = i64::from(c as u8 - b'0');
            app.rate_selected(library, rating);
        }
        KeyCode::Char(' ') => app.enqueue_selected(library.catalog()),
        KeyCode::Char('P') => app.play_queue(library),
        KeyCode::Char('c') => app.clear_queue(),
        KeyCode::Char('i') => app.open_prompt(PromptKind::Import),
        KeyCode::Char('e') => app.open_prompt(PromptKind::Export),
        KeyCode::Char('w') => app.save(library),
        KeyCode::Char('R') => {
            app.reload(library);
            state.cancel_cover();
        }
        _ => {}
    }
    false
}
