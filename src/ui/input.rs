//! Input handling for the TUI.
//!
//! This module processes keyboard input and dispatches to the appropriate
//! handler based on overlays, modal states and the current view.

use crate::app::{App, AppEvent, BatchMode, BatchState, View};
use crate::content::ContentProvider;
use crate::deck::SwipeDirection;
use crate::i18n::Key;
use crate::keybindings::{Action as KbAction, Context as KbContext};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::helpers::{
    open_cover_file, open_video, playback_callback, share_fact, spawn_speech, start_batch,
    warm_cover,
};
use super::Action;

/// Main input dispatch function.
///
/// Routes input to the appropriate handler based on current mode and view.
pub(super) async fn handle_input<P>(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    provider: &Arc<P>,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action>
where
    P: ContentProvider + 'static,
{
    // Handle help overlay input first (captures all keys when visible)
    if app.show_help {
        return Ok(handle_help_input(app, code));
    }

    // Onboarding overlay captures all keys until dismissed
    if app.onboarding.is_some() {
        return Ok(handle_onboarding_input(app, code, modifiers).await);
    }

    // Search input captures typing
    if app.search_mode {
        return Ok(handle_search_input(app, code, modifiers));
    }

    match app.view {
        View::Discovery => handle_deck_input(app, code, modifiers, provider, event_tx).await,
        View::Detail => handle_detail_input(app, code, modifiers, provider, event_tx).await,
        View::Favorites => handle_favorites_input(app, code, modifiers, provider, event_tx).await,
    }
}

/// Handle input while the help overlay is visible.
///
/// Captures all keys: j/k/Up/Down scroll, Esc/q/? dismiss.
fn handle_help_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

async fn handle_onboarding_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Action {
    match app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Onboarding)
    {
        Some(KbAction::Quit) => return Action::Quit,
        Some(KbAction::OnboardingNext) => {
            if app.onboarding_next() {
                app.finish_onboarding().await;
            }
        }
        Some(KbAction::OnboardingSkip) => app.finish_onboarding().await,
        _ => {}
    }
    Action::Continue
}

/// Handle input while typing a favorites search query.
fn handle_search_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Action {
    match app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Search)
    {
        Some(KbAction::Quit) => return Action::Quit,
        Some(KbAction::ExitSearch) => {
            app.exit_search(false);
            return Action::Continue;
        }
        Some(KbAction::CommitSearch) => {
            app.exit_search(true);
            return Action::Continue;
        }
        _ => {}
    }

    match code {
        KeyCode::Backspace => app.search_pop(),
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => app.search_push(c),
        _ => {}
    }
    Action::Continue
}

/// Actions available in every non-modal view. Returns `None` when `action`
/// is not one of them.
fn handle_global_action<P>(
    app: &mut App,
    action: KbAction,
    provider: &Arc<P>,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Option<Action>
where
    P: ContentProvider + 'static,
{
    match action {
        KbAction::Quit => return Some(Action::Quit),
        KbAction::ShowHelp => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
        KbAction::CycleTheme => app.cycle_theme(),
        KbAction::ToggleLanguage => {
            app.toggle_language();
            start_batch(app, BatchMode::Replace, provider, event_tx);
        }
        KbAction::ToggleMute => {
            app.toggle_mute();
        }
        _ => return None,
    }
    Some(Action::Continue)
}

/// Handle input in the discovery deck.
async fn handle_deck_input<P>(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    provider: &Arc<P>,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action>
where
    P: ContentProvider + 'static,
{
    let Some(action) = app.keybindings.action_for_key(code, modifiers, KbContext::Deck) else {
        return Ok(Action::Continue);
    };
    if let Some(result) = handle_global_action(app, action, provider, event_tx) {
        return Ok(result);
    }

    match action {
        KbAction::SwipeLeft | KbAction::SwipeRight => {
            let direction = if action == KbAction::SwipeLeft {
                SwipeDirection::Left
            } else {
                SwipeDirection::Right
            };
            if let Some(swipe) = app.swipe(direction) {
                tracing::debug!(fact_id = %swipe.fact_id, ?direction, "Card swiped");
                let next = swipe.preload.and_then(|id| app.deck.get(&id).cloned());
                if let Some(fact) = next {
                    warm_cover(app, &fact, false, event_tx);
                }
            }
        }
        KbAction::OpenDetail => {
            if let Some(fact) = app.deck.current().cloned() {
                app.open_detail(fact, playback_callback(event_tx));
            }
        }
        KbAction::ToggleFavorite => {
            if let Some(fact) = app.focused_fact() {
                app.toggle_favorite(&fact).await;
            }
        }
        KbAction::ShowFavorites => app.show_favorites(),
        KbAction::Share => {
            if let Some(fact) = app.deck.current().cloned() {
                share_fact(app, &fact);
            }
        }
        KbAction::Retry => {
            if matches!(app.batch, BatchState::Failed(_)) {
                let mode = if app.deck.is_empty() {
                    BatchMode::Replace
                } else {
                    BatchMode::Append
                };
                start_batch(app, mode, provider, event_tx);
            }
        }
        KbAction::SummonMore => {
            if app.can_summon() {
                start_batch(app, BatchMode::Append, provider, event_tx);
            }
        }
        _ => {}
    }
    Ok(Action::Continue)
}

/// Handle input in the detail view.
async fn handle_detail_input<P>(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    provider: &Arc<P>,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action>
where
    P: ContentProvider + 'static,
{
    let Some(action) = app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Detail)
    else {
        return Ok(Action::Continue);
    };
    if let Some(result) = handle_global_action(app, action, provider, event_tx) {
        return Ok(result);
    }

    match action {
        KbAction::Back => app.close_detail(),
        KbAction::ToggleNarration => {
            if let Some(request) = app.toggle_narration() {
                spawn_speech(app, request, provider, event_tx);
            }
        }
        KbAction::PauseNarration => app.pause_narration(),
        KbAction::ToggleFavorite => {
            if let Some(fact) = app.focused_fact() {
                app.toggle_favorite(&fact).await;
            }
        }
        KbAction::OpenVideo => {
            if let Some(fact) = app.detail_fact().cloned() {
                open_video(app, &fact);
            }
        }
        KbAction::Share => {
            if let Some(fact) = app.detail_fact().cloned() {
                share_fact(app, &fact);
            }
        }
        KbAction::OpenCover => {
            if let Some(fact) = app.detail_fact().cloned() {
                let cached = app.cover_paths.get(&fact.id).cloned().or_else(|| {
                    let cache = app.covers.as_ref()?;
                    cache.cached(fact.image_url.as_deref()?)
                });
                match cached {
                    Some(path) => open_cover_file(app, &path),
                    None => {
                        if !warm_cover(app, &fact, true, event_tx) {
                            app.set_status(app.t(Key::CoverMissing));
                        }
                    }
                }
            }
        }
        KbAction::ScrollDown => app.scroll_detail(1),
        KbAction::ScrollUp => app.scroll_detail(-1),
        _ => {}
    }
    Ok(Action::Continue)
}

/// Handle input in the favorites view.
async fn handle_favorites_input<P>(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    provider: &Arc<P>,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action>
where
    P: ContentProvider + 'static,
{
    // Category chips are positional: 1 selects the first chip shown.
    if let KeyCode::Char(c @ '1'..='9') = code {
        if !modifiers.contains(KeyModifiers::CONTROL) {
            let slot = c as usize - '0' as usize;
            app.toggle_category_slot(slot);
            return Ok(Action::Continue);
        }
    }

    let Some(action) = app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Favorites)
    else {
        return Ok(Action::Continue);
    };
    if let Some(result) = handle_global_action(app, action, provider, event_tx) {
        return Ok(result);
    }

    match action {
        KbAction::Back => app.view = View::Discovery,
        KbAction::NavDown => app.move_favorites_selection(1),
        KbAction::NavUp => app.move_favorites_selection(-1),
        KbAction::OpenDetail => {
            if let Some(fact) = app.selected_favorite().cloned() {
                app.open_detail(fact, playback_callback(event_tx));
            }
        }
        KbAction::ToggleFavorite => {
            if let Some(fact) = app.focused_fact() {
                app.toggle_favorite(&fact).await;
            }
        }
        KbAction::EnterSearch => app.enter_search(),
        KbAction::Shuffle => {
            app.shuffle_favorites();
        }
        KbAction::ClearCategories => app.clear_categories(),
        _ => {}
    }
    Ok(Action::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::content::ProviderError;
    use crate::favorites::FavoritesStore;
    use crate::model::{Category, Fact, FactDescriptor, Language};

    struct Offline;

    impl ContentProvider for Offline {
        async fn fetch_facts(&self, _lang: Language) -> Result<Vec<FactDescriptor>, ProviderError> {
            Err(ProviderError::Unavailable("offline".into()))
        }

        async fn generate_image(&self, _prompt: &str) -> Result<Vec<u8>, ProviderError> {
            Err(ProviderError::Unavailable("offline".into()))
        }

        async fn generate_speech(&self, _text: &str) -> Result<Vec<u8>, ProviderError> {
            Err(ProviderError::Unavailable("offline".into()))
        }
    }

    fn fact(id: &str, category: Category) -> Fact {
        Fact {
            id: id.to_string(),
            title: format!("Title {id}"),
            summary: String::new(),
            details: String::new(),
            category,
            video_url: String::new(),
            image_url: None,
        }
    }

    fn setup() -> (App, Arc<Offline>, mpsc::Sender<AppEvent>, mpsc::Receiver<AppEvent>) {
        let app = App::new(&Config::default(), Language::En, FavoritesStore::detached(), None);
        let (tx, rx) = mpsc::channel(32);
        (app, Arc::new(Offline), tx, rx)
    }

    async fn press(
        app: &mut App,
        code: KeyCode,
        provider: &Arc<Offline>,
        tx: &mpsc::Sender<AppEvent>,
    ) -> Action {
        handle_input(app, code, KeyModifiers::NONE, provider, tx)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_quit_key() {
        let (mut app, provider, tx, _rx) = setup();
        let action = press(&mut app, KeyCode::Char('q'), &provider, &tx).await;
        assert!(matches!(action, Action::Quit));
    }

    #[tokio::test]
    async fn test_help_overlay_captures_keys() {
        let (mut app, provider, tx, _rx) = setup();
        press(&mut app, KeyCode::Char('?'), &provider, &tx).await;
        assert!(app.show_help);

        let action = press(&mut app, KeyCode::Char('q'), &provider, &tx).await;
        assert!(matches!(action, Action::Continue));
        assert!(!app.show_help);
    }

    #[tokio::test]
    async fn test_share_reports_copy_outcome() {
        let (mut app, provider, tx, _rx) = setup();
        press(&mut app, KeyCode::Char('c'), &provider, &tx).await;
        assert!(app.status_message.is_none());

        app.deck.reset(vec![fact("a", Category::Ghost)]);
        press(&mut app, KeyCode::Char('c'), &provider, &tx).await;
        // Headless machines have no clipboard; either outcome is reported.
        let status = app.status_message.as_ref().map(|(msg, _)| msg.to_string());
        assert!(
            status.as_deref() == Some(app.t(Key::CopySuccess))
                || status.as_deref() == Some(app.t(Key::CopyFail))
        );
    }

    #[tokio::test]
    async fn test_swipe_and_open_detail() {
        let (mut app, provider, tx, _rx) = setup();
        app.deck.reset(vec![fact("a", Category::Ghost), fact("b", Category::Ufo)]);

        press(&mut app, KeyCode::Right, &provider, &tx).await;
        assert_eq!(app.deck.current().map(|f| f.id.as_str()), Some("a"));

        press(&mut app, KeyCode::Enter, &provider, &tx).await;
        assert_eq!(app.view, View::Detail);
        assert_eq!(app.detail_fact().map(|f| f.id.as_str()), Some("a"));

        press(&mut app, KeyCode::Esc, &provider, &tx).await;
        assert_eq!(app.view, View::Discovery);
    }

    #[tokio::test]
    async fn test_narration_failure_reaches_error_state() {
        let (mut app, provider, tx, mut rx) = setup();
        app.deck.reset(vec![fact("a", Category::Ghost)]);
        press(&mut app, KeyCode::Enter, &provider, &tx).await;
        press(&mut app, KeyCode::Char(' '), &provider, &tx).await;

        let event = rx.recv().await.unwrap();
        super::super::events::handle_app_event(&mut app, event);
        let phase = app.narration.as_ref().map(|n| n.phase());
        assert_eq!(phase, Some(crate::narration::NarrationPhase::Error));
    }

    #[tokio::test]
    async fn test_retry_after_failed_batch() {
        let (mut app, provider, tx, mut rx) = setup();
        start_batch(&mut app, BatchMode::Replace, &provider, &tx);
        while let Some(event) = rx.recv().await {
            let done = matches!(event, AppEvent::BatchFinished { .. });
            super::super::events::handle_app_event(&mut app, event);
            if done {
                break;
            }
        }
        assert!(matches!(app.batch, BatchState::Failed(_)));

        press(&mut app, KeyCode::Char('r'), &provider, &tx).await;
        assert!(app.is_loading());
    }

    #[tokio::test]
    async fn test_favorites_digits_and_search() {
        let (mut app, provider, tx, _rx) = setup();
        app.toggle_favorite(&fact("a", Category::Ghost)).await;
        app.toggle_favorite(&fact("b", Category::Ufo)).await;
        app.show_favorites();

        press(&mut app, KeyCode::Char('2'), &provider, &tx).await;
        assert_eq!(app.displayed_favorites().len(), 1);
        press(&mut app, KeyCode::Char('0'), &provider, &tx).await;
        assert_eq!(app.displayed_favorites().len(), 2);

        press(&mut app, KeyCode::Char('/'), &provider, &tx).await;
        assert!(app.search_mode);
        // Keys bound elsewhere are typed while searching.
        for c in "Title b".chars() {
            press(&mut app, KeyCode::Char(c), &provider, &tx).await;
        }
        press(&mut app, KeyCode::Enter, &provider, &tx).await;
        assert!(!app.search_mode);
        let shown: Vec<&str> = app.displayed_favorites().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(shown, vec!["b"]);
    }

    #[tokio::test]
    async fn test_onboarding_blocks_deck_keys() {
        let (mut app, provider, tx, _rx) = setup();
        app.deck.reset(vec![fact("a", Category::Ghost)]);
        app.onboarding = Some(0);

        let action = press(&mut app, KeyCode::Char('q'), &provider, &tx).await;
        assert!(matches!(action, Action::Continue));
        press(&mut app, KeyCode::Esc, &provider, &tx).await;
        assert_eq!(app.onboarding, None);
        assert_eq!(app.view, View::Discovery);
    }
}
