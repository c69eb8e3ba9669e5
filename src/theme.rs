//! Theme system for the TUI.
//!
//! Provides semantic color roles that map to ratatui `Style` values.
//! The `ThemeVariant` enum selects between Dark and Light palettes, and
//! `CategoryBadge` gives every category kind its own color and glyph.

use ratatui::style::{Color, Modifier, Style};

use crate::model::{Category, CategoryKind};

// ============================================================================
// Theme Variant
// ============================================================================

/// Available theme variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name from a string (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Cycle to the next variant: Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Human-readable name for status display.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

/// A complete color palette mapping every semantic UI role to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Chrome --
    pub header: Style,
    pub header_accent: Style,
    pub status_bar: Style,
    pub panel_border: Style,
    pub overlay_border: Style,
    pub notice: Style,
    pub error: Style,

    // -- Deck --
    pub card_border: Style,
    pub card_border_behind: Style,
    pub card_title: Style,
    pub card_summary: Style,
    pub card_meta: Style,

    // -- Detail --
    pub detail_heading: Style,
    pub detail_body: Style,
    pub link: Style,
    pub narration: Style,
    pub favorite_marker: Style,

    // -- Favorites --
    pub selected: Style,
    pub chip: Style,
    pub chip_active: Style,
    pub search_input: Style,

    /// Badge colors indexed by [`CategoryKind`].
    badges: [Color; 5],
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::DarkGray),
            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            panel_border: Style::default().fg(Color::DarkGray),
            overlay_border: Style::default().fg(Color::Magenta),
            notice: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            card_border: Style::default().fg(Color::Magenta),
            card_border_behind: Style::default().fg(Color::DarkGray),
            card_title: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            card_summary: Style::default().fg(Color::Gray),
            card_meta: Style::default().fg(Color::DarkGray),

            detail_heading: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            detail_body: Style::default(),
            link: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::UNDERLINED),
            narration: Style::default().fg(Color::Cyan),
            favorite_marker: Style::default().fg(Color::Red),

            selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            chip: Style::default().fg(Color::Gray),
            chip_active: Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            search_input: Style::default().fg(Color::Yellow),

            badges: [
                Color::LightBlue,
                Color::LightMagenta,
                Color::LightGreen,
                Color::LightCyan,
                Color::LightYellow,
            ],
        }
    }

    /// Light palette, adapted for light terminal backgrounds.
    fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::DarkGray),
            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            panel_border: Style::default().fg(Color::DarkGray),
            overlay_border: Style::default().fg(Color::Blue),
            notice: Style::default().fg(Color::Magenta),
            error: Style::default().fg(Color::Red),

            card_border: Style::default().fg(Color::Blue),
            card_border_behind: Style::default().fg(Color::Gray),
            card_title: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            card_summary: Style::default().fg(Color::DarkGray),
            card_meta: Style::default().fg(Color::DarkGray),

            detail_heading: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            detail_body: Style::default().fg(Color::Black),
            link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            narration: Style::default().fg(Color::Blue),
            favorite_marker: Style::default().fg(Color::Red),

            selected: Style::default().bg(Color::Blue).fg(Color::White),
            chip: Style::default().fg(Color::DarkGray),
            chip_active: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            search_input: Style::default().fg(Color::Magenta),

            badges: [
                Color::Blue,
                Color::Magenta,
                Color::Green,
                Color::Cyan,
                Color::Red,
            ],
        }
    }

    /// Display descriptor of a category.
    pub fn badge(&self, category: Category) -> CategoryBadge {
        let kind = category.kind();
        let color = self.badges[kind_index(kind)];
        CategoryBadge {
            style: Style::default().fg(color).add_modifier(Modifier::BOLD),
            glyph: kind_glyph(kind),
        }
    }
}

// ============================================================================
// Category Badges
// ============================================================================

/// How a category is drawn: a colored label with a leading glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryBadge {
    pub style: Style,
    pub glyph: &'static str,
}

fn kind_index(kind: CategoryKind) -> usize {
    match kind {
        CategoryKind::Ghost => 0,
        CategoryKind::Witchcraft => 1,
        CategoryKind::Cryptid => 2,
        CategoryKind::Ufo => 3,
        CategoryKind::Phenomenon => 4,
    }
}

fn kind_glyph(kind: CategoryKind) -> &'static str {
    match kind {
        CategoryKind::Ghost => "☾",
        CategoryKind::Witchcraft => "✶",
        CategoryKind::Cryptid => "◆",
        CategoryKind::Ufo => "◉",
        CategoryKind::Phenomenon => "✦",
    }
}

// ============================================================================
// Tests
// ============================================================================
