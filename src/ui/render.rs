//! Render functions for the TUI.
//!
//! This module handles all rendering logic, dispatching to the appropriate
//! view based on application state.

use crate::app::{App, View};
use crate::i18n::Key;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{deck, detail, favorites, help, onboarding, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 16;

/// Main render dispatch function.
///
/// Routes to the appropriate view renderer based on current application state.
/// Handles terminal size validation before rendering.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    // EDGE-001: Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    // EDGE-001: Minimum terminal size check for usable UI
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    match app.view {
        View::Discovery => deck::render(f, app, chunks[1]),
        View::Detail => detail::render(f, app, chunks[1]),
        View::Favorites => favorites::render(f, app, chunks[1]),
    }
    status::render(f, app, chunks[2]);

    // Overlays on top of any view
    if app.onboarding.is_some() {
        onboarding::render(f, app);
    }
    if app.show_help {
        help::render(f, app);
    }
}

/// Title, language, favorites count, music state and batch progress.
fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.view {
        View::Favorites => app.t(Key::FavoritesTitle),
        _ => app.t(Key::AppTitle),
    };

    let music = if app.ambient.narration_active() && !app.ambient.user_muted() {
        app.t(Key::NarrationDucking)
    } else if app.ambient.effective_muted() {
        app.t(Key::Muted)
    } else {
        app.t(Key::Unmuted)
    };

    let mut spans = vec![
        Span::styled(format!(" ☾ {title} "), app.palette.header),
        Span::styled(
            format!(
                " {}  ♥ {}  ♪ {} ",
                app.lang.code().to_uppercase(),
                app.favorites.len(),
                music
            ),
            app.palette.header_accent,
        ),
    ];
    if app.is_loading() && app.deck.current().is_some() {
        spans.push(Span::styled(deck::loading_text(app), app.palette.notice));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::favorites::FavoritesStore;
    use crate::model::{Category, Fact, Language};
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app() -> App {
        App::new(&Config::default(), Language::En, FavoritesStore::detached(), None)
    }

    #[tokio::test]
    async fn test_too_small_terminal() {
        let app = app();
        let mut terminal = Terminal::new(TestBackend::new(30, 8)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        assert!(buffer_text(&terminal).contains("Terminal too small"));
    }

    #[tokio::test]
    async fn test_deck_shows_top_card() {
        let mut app = app();
        app.deck.reset(vec![Fact {
            id: "1".into(),
            title: "Bell Witch".into(),
            summary: "A haunting".into(),
            details: String::new(),
            category: Category::Witchcraft,
            video_url: String::new(),
            image_url: None,
        }]);
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Bell Witch"));
        assert!(text.contains("Paranormal Facts"));
    }

    #[tokio::test]
    async fn test_every_view_renders() {
        let mut app = app();
        app.onboarding = Some(0);
        app.show_help = true;
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        for view in [View::Discovery, View::Favorites] {
            app.view = view;
            terminal.draw(|f| render(f, &app)).unwrap();
        }
    }
}
