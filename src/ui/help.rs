//! Help overlay listing the active keybindings per context, user overrides
//! included.

use crate::app::App;
use crate::keybindings::{Context, KeybindingRegistry};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame,
};

const CONTEXT_ORDER: [Context; 6] = [
    Context::Global,
    Context::Deck,
    Context::Detail,
    Context::Favorites,
    Context::Search,
    Context::Onboarding,
];

/// One line of the help table.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HelpLine {
    Section(&'static str),
    Binding(String, &'static str),
    Gap,
}

/// Flattens the bindings into section headers, entries and gaps.
fn help_lines(keybindings: &KeybindingRegistry) -> Vec<HelpLine> {
    let bindings = keybindings.all_bindings();
    let mut lines = Vec::new();

    for ctx in CONTEXT_ORDER {
        let mut entries: Vec<HelpLine> = bindings
            .iter()
            .filter(|(c, ..)| *c == ctx)
            .map(|(_, key, _, description)| HelpLine::Binding(key.clone(), *description))
            .collect();
        // Category slots are positional, not rebindable
        if ctx == Context::Favorites {
            entries.push(HelpLine::Binding("1-9".to_string(), "Toggle category filter"));
        }
        if entries.is_empty() {
            continue;
        }

        if !lines.is_empty() {
            lines.push(HelpLine::Gap);
        }
        lines.push(HelpLine::Section(ctx.title()));
        lines.extend(entries);
    }

    lines
}

pub fn render(f: &mut Frame, app: &App) {
    let overlay = centered_rect(80, 80, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }
    f.render_widget(Clear, overlay);

    let lines = help_lines(&app.keybindings);

    // Borders and the header row take three lines
    let visible_height = overlay.height.saturating_sub(3) as usize;
    let max_scroll = lines.len().saturating_sub(visible_height);
    let scroll = app.help_scroll_offset.min(max_scroll);

    let rows: Vec<Row> = lines
        .into_iter()
        .skip(scroll)
        .take(visible_height)
        .map(|line| match line {
            HelpLine::Section(title) => Row::new(vec![
                Line::from(Span::styled(
                    format!("-- {title} --"),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
            ])
            .style(app.palette.detail_heading),
            HelpLine::Binding(key, description) => {
                Row::new(vec![format!("  {key}"), description.to_string()])
            }
            HelpLine::Gap => Row::new(vec![String::new(), String::new()]),
        })
        .collect();

    let title = if max_scroll > 0 {
        format!(" Help {}/{} ", scroll + 1, max_scroll + 1)
    } else {
        " Help ".to_string()
    };

    let table = Table::new(rows, [Constraint::Length(16), Constraint::Min(20)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.overlay_border)
                .title(title),
        )
        .header(
            Row::new(vec!["Key", "Action"])
                .style(
                    Style::default()
                        .add_modifier(Modifier::BOLD)
                        .add_modifier(Modifier::UNDERLINED),
                )
                .bottom_margin(1),
        )
        .style(app.palette.detail_body);
    f.render_widget(table, overlay);

    let hint = if scroll < max_scroll {
        " j/k to scroll, ? or Esc to close "
    } else {
        " ? or Esc to close "
    };
    let hint_area = Rect {
        x: overlay.x + 1,
        y: overlay.y + overlay.height.saturating_sub(1),
        width: overlay.width.saturating_sub(2),
        height: 1,
    };
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(hint, app.palette.card_meta))),
        hint_area,
    );
}

/// Create a centered rectangle with the given percentage of the parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect() {
        let rect = centered_rect(50, 50, Rect::new(0, 0, 100, 40));
        assert_eq!(rect, Rect::new(25, 10, 50, 20));
    }

    #[test]
    fn test_help_lines_group_by_context() {
        let lines = help_lines(&KeybindingRegistry::new());

        assert_eq!(lines.first(), Some(&HelpLine::Section("Global")));
        assert_ne!(lines.last(), Some(&HelpLine::Gap));

        let sections: Vec<&str> = lines
            .iter()
            .filter_map(|l| match l {
                HelpLine::Section(title) => Some(*title),
                _ => None,
            })
            .collect();
        let expected: Vec<&str> = CONTEXT_ORDER.iter().map(|c| c.title()).collect();
        assert_eq!(sections, expected);
    }

    #[test]
    fn test_help_lines_include_category_slots() {
        let lines = help_lines(&KeybindingRegistry::new());
        assert!(lines.contains(&HelpLine::Binding(
            "1-9".to_string(),
            "Toggle category filter"
        )));
    }
}
