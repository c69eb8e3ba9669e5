use crate::app::{App, BatchState, SPINNER_FRAMES};
use crate::deck::{CardLayout, DeckStatus};
use crate::i18n::{self, Key};
use crate::loader::BatchStatus;
use crate::model::Fact;
use crate::util::truncate_to_width;
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SPINNER: [&str; SPINNER_FRAMES] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Widest a card is drawn, in columns.
const CARD_MAX_WIDTH: u16 = 56;

/// Render the discovery deck: the top card and up to two behind it.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // EDGE-001: Guard against areas too small for the stacked cards
    if area.width < 3 || area.height < 3 + CardLayout::VISIBLE_DEPTH as u16 {
        return;
    }

    if let BatchState::Failed(_) = app.batch {
        render_message(
            f,
            app,
            area,
            app.t(Key::ErrorTitle),
            &[app.t(Key::ErrorFetch), "", app.t(Key::RetryHint)],
        );
        return;
    }

    match app.deck.status() {
        DeckStatus::Active => render_stack(f, app, area),
        DeckStatus::Empty | DeckStatus::Exhausted if app.is_loading() => {
            let progress = loading_text(app);
            render_message(f, app, area, app.t(Key::AppTitle), &[progress.as_str()]);
        }
        DeckStatus::Empty | DeckStatus::Exhausted => render_message(
            f,
            app,
            area,
            app.t(Key::AllSeenTitle),
            &[app.t(Key::SummonMessage), "", app.t(Key::SummonButton)],
        ),
    }
}

pub fn spinner(app: &App) -> &'static str {
    SPINNER[app.spinner_frame % SPINNER_FRAMES]
}

/// Spinner and progress of the running batch.
pub fn loading_text(app: &App) -> String {
    let spinner = spinner(app);
    let text = match app.batch {
        BatchState::Loading(BatchStatus::FetchingImages { done, total }) => i18n::tf(
            app.lang,
            Key::LoadingImages,
            &[done.to_string().as_str(), total.to_string().as_str()],
        ),
        _ => app.t(Key::LoadingFacts).to_string(),
    };
    format!("{spinner} {text}")
}

fn render_stack(f: &mut Frame, app: &App, area: Rect) {
    let base_width = area.width.min(CARD_MAX_WIDTH);
    let depth = CardLayout::VISIBLE_DEPTH;
    // Rows reserved below the top card for the edges of the cards behind it.
    let peek = depth.saturating_sub(1) as u16;
    let base_height = area.height.saturating_sub(peek).max(3);

    let cards: Vec<(usize, &Fact)> = app.deck.stack(depth).collect();
    // Draw back to front so the top card ends up on top.
    for (position, fact) in cards.into_iter().rev() {
        let layout = CardLayout::for_position(position);
        if !layout.visible {
            continue;
        }
        let width = ((base_width as f32) * layout.scale).round() as u16;
        let card = Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + position as u16,
            width,
            height: base_height,
        };
        f.render_widget(Clear, card);
        if position == 0 {
            render_card(f, app, fact, card);
        } else {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.card_border_behind);
            f.render_widget(block, card);
        }
    }
}

fn render_card(f: &mut Frame, app: &App, fact: &Fact, area: Rect) {
    let badge = app.palette.badge(fact.category);
    let inner_width = area.width.saturating_sub(4) as usize;

    let mut title_spans = vec![Span::styled(
        format!(" {} {} ", badge.glyph, fact.category.label()),
        badge.style,
    )];
    if app.favorites.has(&fact.id) {
        title_spans.push(Span::styled("♥ ", app.palette.favorite_marker));
    }

    let cover = if fact.image_url.is_some() {
        app.t(Key::CoverReady)
    } else {
        app.t(Key::CoverMissing)
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(fact.title.as_str(), app.palette.card_title)),
        Line::from(""),
        Line::from(Span::styled(fact.summary.as_str(), app.palette.card_summary)),
        Line::from(""),
        Line::from(Span::styled(
            truncate_to_width(&format!("▣ {cover}"), inner_width).into_owned(),
            app.palette.card_meta,
        )),
        Line::from(Span::styled(
            format!("{} / {}", app.deck.remaining(), app.deck.len()),
            app.palette.card_meta,
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.card_border)
                .title(Line::from(title_spans)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

/// Centered title and text in place of the deck.
fn render_message(f: &mut Frame, app: &App, area: Rect, title: &str, text: &[&str]) {
    let style = if matches!(app.batch, BatchState::Failed(_)) {
        app.palette.error
    } else {
        app.palette.notice
    };
    let mut lines = vec![Line::from(Span::styled(title.to_string(), style)), Line::from("")];
    lines.extend(text.iter().map(|t| Line::from(t.to_string())));

    let height = (lines.len() as u16 + 2).min(area.height);
    let width = area.width.min(CARD_MAX_WIDTH);
    let rect = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border),
        );
    f.render_widget(paragraph, rect);
}
