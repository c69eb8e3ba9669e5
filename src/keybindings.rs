//! Keybinding registry: maps keys to actions per view, with config overrides.
//!
//! Category filter digits `1`-`9` in the favorites view are not part of the
//! registry; they are positional and handled by the input layer. Config
//! overrides cannot bind digits.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    Back,
    ShowHelp,
    CycleTheme,
    ToggleLanguage,
    ToggleMute,
    SwipeLeft,
    SwipeRight,
    OpenDetail,
    ToggleFavorite,
    ShowFavorites,
    Share,
    Retry,
    SummonMore,
    ToggleNarration,
    PauseNarration,
    OpenVideo,
    OpenCover,
    ScrollDown,
    ScrollUp,
    NavDown,
    NavUp,
    EnterSearch,
    ExitSearch,
    CommitSearch,
    Shuffle,
    ClearCategories,
    OnboardingNext,
    OnboardingSkip,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit application",
            Self::Back => "Go back / dismiss",
            Self::ShowHelp => "Show help",
            Self::CycleTheme => "Cycle theme",
            Self::ToggleLanguage => "Switch language (new deck)",
            Self::ToggleMute => "Mute / unmute background music",
            Self::SwipeLeft => "Swipe card left",
            Self::SwipeRight => "Swipe card right",
            Self::OpenDetail => "Open fact details",
            Self::ToggleFavorite => "Add / remove favorite",
            Self::ShowFavorites => "Show favorites",
            Self::Share => "Copy fact to clipboard",
            Self::Retry => "Retry failed batch",
            Self::SummonMore => "Summon more facts",
            Self::ToggleNarration => "Narrate / pause / resume",
            Self::PauseNarration => "Pause narration",
            Self::OpenVideo => "Open video in browser",
            Self::OpenCover => "Open cover image",
            Self::ScrollDown => "Scroll down one line",
            Self::ScrollUp => "Scroll up one line",
            Self::NavDown => "Navigate down",
            Self::NavUp => "Navigate up",
            Self::EnterSearch => "Search favorites",
            Self::ExitSearch => "Clear search",
            Self::CommitSearch => "Finish search",
            Self::Shuffle => "Shuffle favorites",
            Self::ClearCategories => "Show all categories",
            Self::OnboardingNext => "Next onboarding step",
            Self::OnboardingSkip => "Skip onboarding",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Deck,
    Detail,
    Favorites,
    Search,
    Onboarding,
}

impl Context {
    pub fn title(self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::Deck => "Deck",
            Self::Detail => "Details",
            Self::Favorites => "Favorites",
            Self::Search => "Search",
            Self::Onboarding => "Onboarding",
        }
    }
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Supported formats:
/// - Single char: "q", "j", "/"
/// - Named keys: "Enter", "Esc", "Tab", "Up", "Down", "Left", "Right", "Backspace", "Space"
/// - Modifier combos: "Ctrl+d"
/// - Function keys: "F1" through "F12"
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let mut chars = rest.trim().chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c)),
            _ => None,
        };
    }

    match s.to_lowercase().as_str() {
        "enter" | "return" => return Some(KeySpec::plain(KeyCode::Enter)),
        "esc" | "escape" => return Some(KeySpec::plain(KeyCode::Esc)),
        "tab" => return Some(KeySpec::plain(KeyCode::Tab)),
        "up" => return Some(KeySpec::plain(KeyCode::Up)),
        "down" => return Some(KeySpec::plain(KeyCode::Down)),
        "left" => return Some(KeySpec::plain(KeyCode::Left)),
        "right" => return Some(KeySpec::plain(KeyCode::Right)),
        "backspace" => return Some(KeySpec::plain(KeyCode::Backspace)),
        "space" => return Some(KeySpec::char(' ')),
        _ => {}
    }

    if let Some(n) = s
        .strip_prefix(['F', 'f'])
        .and_then(|rest| rest.parse::<u8>().ok())
    {
        return (1..=12).contains(&n).then_some(KeySpec::plain(KeyCode::F(n)));
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        // Digits are reserved for category filters.
        (Some(c), None) if !c.is_ascii_digit() => Some(KeySpec::char(c)),
        _ => None,
    }
}

/// Format a KeySpec as a human-readable string for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings, supporting default bindings and config overrides.
///
/// The same key can map to different actions in different contexts; lookups
/// fall back to `Global` when the view has no binding of its own.
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn bind_all(&mut self, context: Context, keys: &[KeySpec], action: Action) {
        for key in keys {
            self.bind(context, *key, action);
        }
    }

    fn register_defaults(&mut self) {
        use Context::*;

        // === Global ===
        self.bind(Global, KeySpec::char('q'), Action::Quit);
        self.bind(Global, KeySpec::ctrl('c'), Action::Quit);
        self.bind(Global, KeySpec::plain(KeyCode::Esc), Action::Back);
        self.bind(Global, KeySpec::char('?'), Action::ShowHelp);
        self.bind(Global, KeySpec::char('T'), Action::CycleTheme);
        self.bind(Global, KeySpec::char('L'), Action::ToggleLanguage);
        self.bind(Global, KeySpec::char('m'), Action::ToggleMute);

        // === Deck ===
        self.bind_all(
            Deck,
            &[KeySpec::char('h'), KeySpec::plain(KeyCode::Left)],
            Action::SwipeLeft,
        );
        self.bind_all(
            Deck,
            &[KeySpec::char('l'), KeySpec::plain(KeyCode::Right)],
            Action::SwipeRight,
        );
        self.bind(Deck, KeySpec::plain(KeyCode::Enter), Action::OpenDetail);
        self.bind(Deck, KeySpec::char('f'), Action::ToggleFavorite);
        self.bind(Deck, KeySpec::char('b'), Action::ShowFavorites);
        self.bind(Deck, KeySpec::char('c'), Action::Share);
        self.bind(Deck, KeySpec::char('r'), Action::Retry);
        self.bind(Deck, KeySpec::char('n'), Action::SummonMore);

        // === Detail ===
        self.bind(Detail, KeySpec::char(' '), Action::ToggleNarration);
        self.bind(Detail, KeySpec::char('x'), Action::PauseNarration);
        self.bind(Detail, KeySpec::char('f'), Action::ToggleFavorite);
        self.bind(Detail, KeySpec::char('o'), Action::OpenVideo);
        self.bind(Detail, KeySpec::char('i'), Action::OpenCover);
        self.bind(Detail, KeySpec::char('c'), Action::Share);
        self.bind_all(
            Detail,
            &[KeySpec::char('j'), KeySpec::plain(KeyCode::Down)],
            Action::ScrollDown,
        );
        self.bind_all(
            Detail,
            &[KeySpec::char('k'), KeySpec::plain(KeyCode::Up)],
            Action::ScrollUp,
        );

        // === Favorites ===
        self.bind_all(
            Favorites,
            &[KeySpec::char('j'), KeySpec::plain(KeyCode::Down)],
            Action::NavDown,
        );
        self.bind_all(
            Favorites,
            &[KeySpec::char('k'), KeySpec::plain(KeyCode::Up)],
            Action::NavUp,
        );
        self.bind(Favorites, KeySpec::plain(KeyCode::Enter), Action::OpenDetail);
        self.bind(Favorites, KeySpec::char('f'), Action::ToggleFavorite);
        self.bind(Favorites, KeySpec::char('/'), Action::EnterSearch);
        self.bind(Favorites, KeySpec::char('s'), Action::Shuffle);
        self.bind(Favorites, KeySpec::char('0'), Action::ClearCategories);

        // === Search ===
        self.bind(Search, KeySpec::plain(KeyCode::Esc), Action::ExitSearch);
        self.bind(Search, KeySpec::plain(KeyCode::Enter), Action::CommitSearch);

        // === Onboarding ===
        self.bind_all(
            Onboarding,
            &[
                KeySpec::plain(KeyCode::Enter),
                KeySpec::char(' '),
                KeySpec::plain(KeyCode::Right),
                KeySpec::char('l'),
            ],
            Action::OnboardingNext,
        );
        self.bind(Onboarding, KeySpec::plain(KeyCode::Esc), Action::OnboardingSkip);
    }

    /// Apply user overrides from the config `[keybindings]` table.
    ///
    /// Keys in the map are action names (e.g., "quit", "swipe_left").
    /// Values are key strings (e.g., "q", "Ctrl+d", "F5").
    ///
    /// Returns a list of warnings for unrecognized action names or unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };

            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = self
                .bindings
                .iter()
                .filter(|(_, _, a)| *a == action)
                .map(|(c, _, _)| *c)
                .collect();
            contexts.dedup();

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);

            // Re-bind in the same contexts with the new key
            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(action = %action_name, key = %key_str, "Applied keybinding override");
        }

        warnings
    }

    /// Look up the action for a key in a context, falling back to Global.
    ///
    /// Onboarding and Search are modal: they only fall back for `Quit`.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        // Shift is already reflected in the character itself.
        let modifiers = match code {
            KeyCode::Char(_) => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        let key = KeySpec::new(code, modifiers);

        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }

        let global = self.lookup.get(&(Context::Global, key)).copied();
        match context {
            Context::Global => global,
            Context::Onboarding | Context::Search => {
                global.filter(|a| *a == Action::Quit && modifiers.contains(KeyModifiers::CONTROL))
            }
            _ => global,
        }
    }

    /// Get all bindings for the help screen.
    ///
    /// Returns (context, key_display_string, action, description) tuples.
    pub fn all_bindings(&self) -> Vec<(Context, String, Action, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), *action, action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name string (from config) into an Action.
fn parse_action_name(name: &str) -> Option<Action> {
    let action = match name.to_lowercase().replace('-', "_").as_str() {
        "quit" => Action::Quit,
        "back" => Action::Back,
        "show_help" | "help" => Action::ShowHelp,
        "cycle_theme" | "theme" => Action::CycleTheme,
        "toggle_language" | "language" | "lang" => Action::ToggleLanguage,
        "toggle_mute" | "mute" => Action::ToggleMute,
        "swipe_left" => Action::SwipeLeft,
        "swipe_right" => Action::SwipeRight,
        "open_detail" | "details" | "select" => Action::OpenDetail,
        "toggle_favorite" | "favorite" => Action::ToggleFavorite,
        "show_favorites" | "favorites" => Action::ShowFavorites,
        "share" | "copy" => Action::Share,
        "retry" => Action::Retry,
        "summon_more" | "summon" | "load_more" => Action::SummonMore,
        "toggle_narration" | "narrate" => Action::ToggleNarration,
        "pause_narration" | "pause" => Action::PauseNarration,
        "open_video" | "video" => Action::OpenVideo,
        "open_cover" | "cover" | "image" => Action::OpenCover,
        "scroll_down" => Action::ScrollDown,
        "scroll_up" => Action::ScrollUp,
        "nav_down" | "down" => Action::NavDown,
        "nav_up" | "up" => Action::NavUp,
        "enter_search" | "search" => Action::EnterSearch,
        "exit_search" => Action::ExitSearch,
        "commit_search" => Action::CommitSearch,
        "shuffle" => Action::Shuffle,
        "clear_categories" | "all_categories" => Action::ClearCategories,
        "onboarding_next" => Action::OnboardingNext,
        "onboarding_skip" => Action::OnboardingSkip,
        _ => return None,
    };
    Some(action)
}

// ============================================================================
// Tests
// ============================================================================
