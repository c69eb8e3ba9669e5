use crate::app::App;
use crate::content::video::embed_url;
use crate::i18n::Key;
use crate::narration::NarrationState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::time::Duration;

/// Render the detail view of the open fact.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // EDGE-001: Guard against zero-width/height areas
    if area.width < 3 || area.height < 5 {
        return;
    }

    let Some(detail) = app.detail.as_ref() else {
        return;
    };
    let fact = &detail.fact;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let badge = app.palette.badge(fact.category);
    let favorite = if app.favorites.has(&fact.id) {
        Span::styled(format!("♥ {}", app.t(Key::Unfavorite)), app.palette.favorite_marker)
    } else {
        Span::styled(format!("♡ {}", app.t(Key::Favorite)), app.palette.card_meta)
    };

    let mut lines = vec![
        Line::from(Span::styled(fact.title.as_str(), app.palette.detail_heading)),
        Line::from(vec![
            Span::styled(
                format!("{} {}", badge.glyph, fact.category.label()),
                badge.style,
            ),
            Span::raw("  "),
            favorite,
        ]),
        Line::from(""),
    ];
    lines.extend(
        fact.details
            .lines()
            .map(|l| Line::from(Span::styled(l, app.palette.detail_body))),
    );
    lines.push(Line::from(""));

    let cover = if app.cover_paths.contains_key(&fact.id) || fact.image_url.is_some() {
        app.t(Key::CoverReady)
    } else {
        app.t(Key::CoverMissing)
    };
    lines.push(Line::from(Span::styled(format!("▣ {cover}"), app.palette.card_meta)));

    match embed_url(&fact.video_url) {
        Some(url) => lines.push(Line::from(vec![
            Span::styled(format!("▶ {}: ", app.t(Key::VideoLink)), app.palette.card_meta),
            Span::styled(url, app.palette.link),
        ])),
        None if !fact.video_url.trim().is_empty() => lines.push(Line::from(vec![
            Span::styled(format!("▶ {}: ", app.t(Key::VideoLink)), app.palette.card_meta),
            Span::styled(fact.video_url.trim(), app.palette.link),
        ])),
        None => lines.push(Line::from(Span::styled(
            format!("▶ {}", app.t(Key::NoVideo)),
            app.palette.card_meta,
        ))),
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border),
        )
        .wrap(Wrap { trim: false })
        .scroll((detail.scroll, 0));
    f.render_widget(paragraph, chunks[0]);

    render_narration(f, app, chunks[1]);
}

/// The narration control: label of the next action plus progress.
fn render_narration(f: &mut Frame, app: &App, area: Rect) {
    let Some(narration) = app.narration.as_ref() else {
        return;
    };

    let line = match narration.state() {
        NarrationState::Idle => Line::from(format!("▶ {}", app.t(Key::ReadAloud))),
        NarrationState::Loading { .. } => Line::from(format!(
            "{} {}",
            super::deck::spinner(app),
            app.t(Key::SpeechLoading)
        )),
        NarrationState::Playing { buffer, .. } => Line::from(format!(
            "❚❚ {}  {} / {}",
            app.t(Key::PauseSpeech),
            format_clock(narration.position()),
            format_clock(buffer.duration())
        )),
        NarrationState::Paused { buffer, offset } => Line::from(format!(
            "▶ {}  {} / {}",
            app.t(Key::ResumeSpeech),
            format_clock(*offset),
            format_clock(buffer.duration())
        )),
        NarrationState::Error { .. } => Line::from(vec![
            Span::styled(app.t(Key::TtsError), app.palette.error),
            Span::raw("  "),
            Span::raw(format!("▶ {}", app.t(Key::ReadAloud))),
        ]),
    };

    let paragraph = Paragraph::new(line).style(app.palette.narration).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.palette.panel_border),
    );
    f.render_widget(paragraph, area);
}

fn format_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
