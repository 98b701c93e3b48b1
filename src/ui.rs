//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::{App, InputMode};
use crate::catalog::{CatalogState, MAX_RATING, TrackCatalog, TrackRecord};
use crate::config::UiSettings;
use crate::cover::{CoverMeta, CoverStatus};

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("gg/G", "top/bottom");
    map.insert("enter", "details + play");
    map.insert("0-5", "rate");
    map.insert("space", "queue");
    map.insert("P", "play queue");
    map.insert("c", "clear queue");
    map.insert("/", "artist filter");
    map.insert("a", "next artist");
    map.insert("i/e", "import/export");
    map.insert("w", "save");
    map.insert("R", "reload");
    map.insert("q", "quit");
    map
});

/// Render the controls help text.
fn controls_text() -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "gg/G", "enter", "0-5", "space", "P", "c", "/", "a", "i/e", "w", "R", "q",
    ];
    order
        .iter()
        .filter_map(|k| CONTROLS_MAP.get(k).map(|v| format!("[{}] {}", k, v)))
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Render a rating as filled and empty stars.
fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(MAX_RATING));
    let empty = usize::from(MAX_RATING) - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

fn list_line(key: impl std::fmt::Display, record: &TrackRecord) -> String {
    format!(
        "{}: {} by {}  {}  ({} plays)",
        key,
        record.title(),
        record.singer(),
        stars(record.rating()),
        record.play_count()
    )
}

fn meta_text(meta: &CoverMeta) -> String {
    format!(
        "{}, {} bytes",
        meta.content_type.as_deref().unwrap_or("unknown type"),
        meta.bytes
    )
}

fn cover_text(url: &str, status: &CoverStatus) -> String {
    match status {
        CoverStatus::Loading { url } => format!("{url} (loading...)"),
        CoverStatus::Ready { url, meta } => format!("{url} ({})", meta_text(meta)),
        CoverStatus::Failed { url, reason } => format!("{url} (unavailable: {reason})"),
        // Probing disabled or cancelled.
        CoverStatus::Idle => url.to_string(),
    }
}

fn details_text(record: &TrackRecord, cover: &CoverStatus) -> String {
    let cover = match record.image_url() {
        Some(url) => cover_text(url, cover),
        None => "-".to_string(),
    };
    format!(
        "Song: {}\nSinger: {}\nRating: {} ({})\nPlays: {}\nLink: {}\nCover: {}",
        record.title(),
        record.singer(),
        stars(record.rating()),
        record.rating(),
        record.play_count(),
        if record.link().is_empty() { "-" } else { record.link() },
        cover
    )
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn left_padded(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

/// Render the entire UI into the provided `frame`.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    catalog: &TrackCatalog,
    location: &str,
    cover: &CoverStatus,
    ui_settings: &UiSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" jukebox ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Status box
    let status = {
        let mut parts: Vec<String> = Vec::new();
        match catalog.state() {
            CatalogState::Loaded => parts.push(format!("TRACKS: {}", catalog.len())),
            CatalogState::Empty => parts.push("TRACKS: none loaded".to_string()),
        }
        if app.artist_filter.is_empty() {
            parts.push("ARTIST: All".to_string());
        } else {
            parts.push(format!("ARTIST: {}", app.artist_filter));
        }
        parts.push(format!("QUEUE: {}", app.queue.len()));
        parts.push(format!("File: {}", location));
        if !app.status.is_empty() {
            parts.push(app.status.clone());
        }
        parts.join(" • ")
    };
    let status_par = Paragraph::new(status)
        .block(left_padded(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(chunks[2]);

    // Track list
    {
        let visible = app.visible(catalog);

        // Center the selected item when possible by creating a visible window.
        // Only build ListItems for the visible window.
        let total = visible.len();
        let list_height = main[0].height.saturating_sub(2) as usize;
        let sel_pos = app
            .selected
            .and_then(|s| visible.iter().position(|(k, _)| *k == s))
            .unwrap_or(0);
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let items: Vec<ListItem> = if total == 0 {
            let msg = if app.artist_filter.is_empty() {
                "No tracks found!".to_string()
            } else {
                format!("No tracks found for {}", app.artist_filter)
            };
            vec![ListItem::new(msg)]
        } else {
            visible[start..end]
                .iter()
                .map(|(key, record)| ListItem::new(list_line(key, record)))
                .collect()
        };

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" tracks "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, main[0], &mut state);
    }

    // Play queue
    {
        let items: Vec<ListItem> = app
            .queue
            .iter()
            .filter_map(|key| {
                catalog
                    .get(*key)
                    .map(|r| ListItem::new(format!("{}: {}", key, r.title())))
            })
            .collect();
        let queue = List::new(items).block(Block::default().borders(Borders::ALL).title(" queue "));
        frame.render_widget(queue, main[1]);
    }

    // Input line
    let (input_title, input_text) = match app.input {
        InputMode::Normal => (" input ".to_string(), String::new()),
        InputMode::Filter => (" artist filter (enter/esc) ".to_string(), app.artist_filter.clone()),
        InputMode::Prompt(kind) => (format!(" {} (enter/esc) ", kind.label()), app.prompt.clone()),
    };
    let input = Paragraph::new(input_text).block(left_padded(&input_title));
    frame.render_widget(input, chunks[3]);

    // Overlay details popup (keeps list visible under it)
    if let Some(key) = app.details {
        let popup_area = centered_rect_sized(72, 9, main[0]);
        frame.render_widget(Clear, popup_area);

        let text = match catalog.get(key) {
            Some(record) => details_text(record, cover),
            None => format!("Track {key} not found"),
        };
        let title = format!(" track {key} (K closes) ");
        let details = Paragraph::new(text)
            .block(left_padded(&title))
            .wrap(Wrap { trim: true });
        frame.render_widget(details, popup_area);
    }

    let footer = Paragraph::new(controls_text())
        .block(left_padded(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}
