use crate::app::{App, View};
use crate::i18n::Key;
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // EDGE-001: Guard against zero-width/height areas
    if area.width < 1 || area.height < 1 {
        return;
    }

    // Transient messages win over the keybinding hints
    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        let hints = match app.view {
            View::Discovery => Key::DeckHints,
            View::Detail => Key::DetailHints,
            View::Favorites if app.search_mode => Key::SearchHints,
            View::Favorites => Key::FavoritesHints,
        };
        Cow::Borrowed(app.t(hints))
    };

    let paragraph = Paragraph::new(text).style(app.palette.status_bar);
    f.render_widget(paragraph, area);
}
