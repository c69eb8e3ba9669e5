use crate::app::App;
use crate::i18n::{self, Key};
use crate::util::{display_width, truncate_to_width};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

/// Render the favorites view: search box, category chips and the list.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // EDGE-001: Guard against zero-width/height areas
    if area.width < 3 || area.height < 8 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);

    render_search_box(f, app, chunks[0]);
    render_chips(f, app, chunks[1]);
    render_list(f, app, chunks[2]);
}

fn render_search_box(f: &mut Frame, app: &App, area: Rect) {
    let query = app.filter.query();
    let line = if query.is_empty() && !app.search_mode {
        Line::from(Span::styled(app.t(Key::SearchPlaceholder), app.palette.card_meta))
    } else {
        let cursor = if app.search_mode { "_" } else { "" };
        Line::from(Span::styled(format!("{query}{cursor}"), app.palette.search_input))
    };
    let border = if app.search_mode {
        app.palette.overlay_border
    } else {
        app.palette.panel_border
    };
    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(" / "),
    );
    f.render_widget(paragraph, area);
}

/// "0 All" followed by one numbered chip per category among the favorites.
fn render_chips(f: &mut Frame, app: &App, area: Rect) {
    let selected = app.filter.categories();
    let all_style = if selected.is_empty() {
        app.palette.chip_active
    } else {
        app.palette.chip
    };

    let mut spans = vec![
        Span::styled(format!(" 0 {} ", app.t(Key::AllCategories)), all_style),
        Span::raw(" "),
    ];
    for (i, category) in app.favorites.categories().into_iter().enumerate().take(9) {
        let badge = app.palette.badge(category);
        let style = if selected.contains(&category) {
            app.palette.chip_active
        } else {
            badge.style
        };
        spans.push(Span::styled(
            format!(" {} {} {} ", i + 1, badge.glyph, category.label()),
            style,
        ));
        spans.push(Span::raw(" "));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).wrap(Wrap { trim: true }), area);
}

fn render_list(f: &mut Frame, app: &App, area: Rect) {
    let displayed = app.displayed_favorites();

    let items: Vec<ListItem> = if app.favorites.is_empty() {
        vec![ListItem::new(Span::styled(
            app.t(Key::FavoritesEmpty),
            app.palette.card_meta,
        ))]
    } else if displayed.is_empty() {
        vec![ListItem::new(Span::styled(
            app.t(Key::NoResultsFound),
            app.palette.card_meta,
        ))]
    } else {
        let available_width = area.width.saturating_sub(2) as usize;
        displayed
            .iter()
            .enumerate()
            .map(|(i, fact)| {
                let badge = app.palette.badge(fact.category);
                let prefix = format!("{} ", badge.glyph);
                let max_title = available_width.saturating_sub(display_width(&prefix));

                // SAFE - character-aware truncation using unicode-width
                let title = truncate_to_width(&fact.title, max_title);
                let title_style = if i == app.favorites_selected {
                    app.palette.selected
                } else {
                    app.palette.card_title
                };
                ListItem::new(Line::from(vec![
                    Span::styled(prefix, badge.style),
                    Span::styled(title, title_style),
                ]))
            })
            .collect()
    };

    let mut title = format!(" {} ", app.t(Key::FavoritesTitle));
    if !app.favorites.is_empty() {
        let count = i18n::tf(
            app.lang,
            Key::MatchCount,
            &[displayed.len().to_string().as_str(), app.favorites.len().to_string().as_str()],
        );
        title.push_str(&format!("({count}) "));
    }
    if app.filter.is_shuffled() {
        title.push_str(&format!("⤮ {} ", app.t(Key::Shuffled)));
    }

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.palette.panel_border)
            .title(title),
    );
    f.render_widget(list, area);
}
