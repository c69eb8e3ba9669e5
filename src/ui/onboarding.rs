use crate::app::App;
use crate::i18n::{Key, ONBOARDING_STEPS};
use ratatui::{
    layout::Alignment,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::help::centered_rect;

/// Render the onboarding overlay for the current step.
pub fn render(f: &mut Frame, app: &App) {
    let Some(step) = app.onboarding else {
        return;
    };
    let Some((title, text)) = ONBOARDING_STEPS.get(step) else {
        return;
    };

    let overlay = centered_rect(60, 50, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }
    f.render_widget(Clear, overlay);

    let last = step + 1 == ONBOARDING_STEPS.len();
    let button = if last {
        app.t(Key::OnboardingFinish)
    } else {
        app.t(Key::OnboardingNext)
    };
    let dots: String = (0..ONBOARDING_STEPS.len())
        .map(|i| if i == step { '●' } else { '○' })
        .collect();

    let lines = vec![
        Line::from(Span::styled(app.t(*title), app.palette.detail_heading)),
        Line::from(""),
        Line::from(app.t(*text)),
        Line::from(""),
        Line::from(Span::styled(dots, app.palette.card_meta)),
        Line::from(""),
        Line::from(Span::styled(format!("[Enter] {button}"), app.palette.notice)),
    ];

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.overlay_border)
                .title(format!(" {} ", app.t(Key::AppTitle))),
        );
    f.render_widget(paragraph, overlay);
}
