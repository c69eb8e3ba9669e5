//! Application state.
//!
//! The UI loop owns the single [`App`]. Background tasks never touch it: they
//! report through [`AppEvent`]s that carry the generation they were started
//! under, so results that arrive after the user moved on are dropped here.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::PathBuf;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::Config;
use crate::content::cover::CoverCache;
use crate::content::ProviderError;
use crate::deck::{Deck, DeckStatus, Swipe, SwipeDirection};
use crate::favorites::{FavoritesStore, Toggled};
use crate::filter::FavoritesFilter;
use crate::i18n::{self, Key, ONBOARDING_STEPS};
use crate::keybindings::KeybindingRegistry;
use crate::loader::{BatchEvent, BatchReport, BatchStatus};
use crate::model::{Category, Fact, Language};
use crate::narration::{
    AmbientAudio, ClockSink, FinishedCallback, NarrationController, NarrationPhase,
    SpeechLoaded, SpeechRequest,
};
use crate::share::SystemClipboard;
use crate::storage::{Database, ONBOARDING_COMPLETE_KEY};
use crate::theme::{ColorPalette, ThemeVariant};
use crate::util::MAX_SEARCH_QUERY_LENGTH;

/// How long a status message stays on screen.
const STATUS_TTL_SECS: u64 = 3;

/// Number of frames in the loading spinner animation.
pub const SPINNER_FRAMES: usize = 10;

// ============================================================================
// Views and Sub-states
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Discovery,
    Detail,
    Favorites,
}

/// Whether a new batch replaces the deck or extends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    Replace,
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Loading(BatchStatus),
    /// The text fetch failed. Blocks the deck until retried.
    Failed(String),
}

/// The fact on display in the detail view and where to return on close.
#[derive(Debug, Clone)]
pub struct DetailState {
    pub fact: Fact,
    pub origin: View,
    pub scroll: u16,
}

// ============================================================================
// Background Events
// ============================================================================

/// Results delivered from background tasks to the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    /// Progress or a finished card from the batch started under `generation`.
    Batch {
        generation: u64,
        event: BatchEvent,
    },
    BatchFinished {
        generation: u64,
        result: Result<BatchReport, ProviderError>,
    },
    SpeechLoaded {
        fact_id: String,
        loaded: SpeechLoaded,
    },
    /// The audio sink reached the end of the playback identified by `token`.
    PlaybackFinished {
        token: u64,
    },
    CoverWarmed {
        fact_id: String,
        result: Result<PathBuf, String>,
        /// The user asked to open this cover and is waiting for it.
        open_when_ready: bool,
    },
    /// A background task panicked. The panic was caught and converted to this event.
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub lang: Language,
    pub theme_variant: ThemeVariant,
    pub palette: ColorPalette,
    pub keybindings: KeybindingRegistry,
    pub view: View,

    // Deck and batch loading
    pub deck: Deck,
    pub batch: BatchState,
    pub batch_generation: u64,
    pub batch_handle: Option<JoinHandle<()>>,

    // Favorites
    pub favorites: FavoritesStore,
    pub filter: FavoritesFilter,
    pub favorites_selected: usize,
    pub search_mode: bool,

    // Detail and narration
    pub detail: Option<DetailState>,
    pub narration: Option<NarrationController<ClockSink>>,
    pub speech_handle: Option<JoinHandle<()>>,
    pub ambient: AmbientAudio,

    // Covers
    pub covers: Option<CoverCache>,
    /// Covers already written to disk, by fact id.
    pub cover_paths: HashMap<String, PathBuf>,
    pub clipboard: SystemClipboard,

    /// Current onboarding step while the overlay is shown.
    pub onboarding: Option<usize>,
    pub db: Option<Database>,

    // UI chrome
    pub show_help: bool,
    pub help_scroll_offset: usize,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
    pub spinner_frame: usize,
}

impl App {
    pub fn new(
        config: &Config,
        lang: Language,
        favorites: FavoritesStore,
        db: Option<Database>,
    ) -> Self {
        let theme_variant = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
            tracing::warn!(theme = %config.theme, "Unknown theme, using dark");
            ThemeVariant::Dark
        });

        let mut keybindings = KeybindingRegistry::new();
        for warning in keybindings.apply_overrides(&config.keybindings) {
            tracing::warn!(%warning, "Ignoring keybinding override");
        }

        Self {
            lang,
            theme_variant,
            palette: theme_variant.palette(),
            keybindings,
            view: View::Discovery,
            deck: Deck::new(),
            batch: BatchState::Idle,
            batch_generation: 0,
            batch_handle: None,
            favorites,
            filter: FavoritesFilter::new(),
            favorites_selected: 0,
            search_mode: false,
            detail: None,
            narration: None,
            speech_handle: None,
            ambient: AmbientAudio::new(config.start_muted),
            covers: CoverCache::default_dir().map(CoverCache::new),
            cover_paths: HashMap::new(),
            clipboard: SystemClipboard::new(),
            onboarding: None,
            db,
            show_help: false,
            help_scroll_offset: 0,
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
        }
    }

    /// Localized string in the current language.
    pub fn t(&self, key: Key) -> &'static str {
        i18n::t(self.lang, key)
    }

    // ========================================================================
    // Status and Chrome
    // ========================================================================

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Clear the status message once it has been visible long enough.
    /// Returns true if a message was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, shown_at)) = &self.status_message {
            if shown_at.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    pub fn cycle_theme(&mut self) {
        self.theme_variant = self.theme_variant.next();
        self.palette = self.theme_variant.palette();
        self.set_status(format!("Theme: {}", self.theme_variant.name()));
    }

    /// Advance the spinner while something is loading. Returns true if a
    /// redraw is needed.
    pub fn on_tick(&mut self) -> bool {
        let narration_loading = self
            .narration
            .as_ref()
            .is_some_and(|n| n.phase() == NarrationPhase::Loading);
        let narration_playing = self
            .narration
            .as_ref()
            .is_some_and(|n| n.phase() == NarrationPhase::Playing);
        if self.is_loading() || narration_loading {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES;
            return true;
        }
        // The playback position is shown live.
        narration_playing && self.view == View::Detail
    }

    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.ambient.toggle_mute();
        self.set_status(self.t(if muted { Key::Muted } else { Key::Unmuted }));
        muted
    }

    // ========================================================================
    // Batch Loading
    // ========================================================================

    pub fn is_loading(&self) -> bool {
        matches!(self.batch, BatchState::Loading(_))
    }

    /// A new batch may be summoned once the deck has nothing left to show.
    pub fn can_summon(&self) -> bool {
        !self.is_loading() && self.deck.status() != DeckStatus::Active
    }

    /// Invalidate any running batch and prepare for a new one. Returns the
    /// generation the new batch task must report under.
    pub fn begin_batch(&mut self, mode: BatchMode) -> u64 {
        if let Some(handle) = self.batch_handle.take() {
            handle.abort();
            tracing::debug!(generation = self.batch_generation, "Aborted previous batch");
        }
        self.batch_generation = self.batch_generation.wrapping_add(1);
        if mode == BatchMode::Replace {
            self.deck.reset(Vec::new());
            self.cover_paths.clear();
        }
        self.batch = BatchState::Loading(BatchStatus::FetchingText);
        self.needs_redraw = true;
        tracing::debug!(generation = self.batch_generation, ?mode, lang = %self.lang, "Batch started");
        self.batch_generation
    }

    pub fn on_batch_event(&mut self, generation: u64, event: BatchEvent) {
        if generation != self.batch_generation {
            tracing::debug!(generation, current = self.batch_generation, "Discarding stale batch event");
            return;
        }
        match event {
            BatchEvent::Status(status) => self.batch = BatchState::Loading(status),
            BatchEvent::Fact(fact) => {
                self.deck.append(fact);
            }
        }
    }

    pub fn on_batch_finished(&mut self, generation: u64, result: Result<BatchReport, ProviderError>) {
        if generation != self.batch_generation {
            tracing::debug!(generation, current = self.batch_generation, "Discarding stale batch result");
            return;
        }
        self.batch_handle = None;
        match result {
            Ok(report) => {
                self.batch = BatchState::Idle;
                if report.skipped > 0 {
                    tracing::warn!(skipped = report.skipped, "Some facts were dropped without a cover");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, kind = ?e.kind(), "Batch failed");
                self.batch = BatchState::Failed(e.to_string());
            }
        }
    }

    // ========================================================================
    // Deck
    // ========================================================================

    /// Swipe the card the deck view shows on top. The returned swipe carries
    /// the preload hint.
    pub fn swipe(&mut self, direction: SwipeDirection) -> Option<Swipe> {
        if self.view != View::Discovery {
            return None;
        }
        let top = self.deck.cursor()?;
        self.deck.on_swiped(top, direction)
    }

    /// Switch language. The caller starts a replacing batch for it.
    pub fn toggle_language(&mut self) -> Language {
        self.close_detail();
        self.lang = self.lang.toggle();
        self.view = View::Discovery;
        self.search_mode = false;
        tracing::info!(lang = %self.lang, "Language switched");
        self.lang
    }

    // ========================================================================
    // Detail and Narration
    // ========================================================================

    /// Show `fact` in the detail view with a fresh narration controller.
    pub fn open_detail(&mut self, fact: Fact, on_finished: FinishedCallback) {
        self.close_detail();
        let origin = if self.view == View::Detail {
            View::Discovery
        } else {
            self.view
        };
        self.narration = Some(NarrationController::new(
            &fact,
            ClockSink::new(on_finished),
            self.ambient.tts_flag(),
        ));
        self.detail = Some(DetailState {
            fact,
            origin,
            scroll: 0,
        });
        self.view = View::Detail;
    }

    /// Leave the detail view. Dropping the controller stops playback.
    pub fn close_detail(&mut self) {
        if let Some(handle) = self.speech_handle.take() {
            handle.abort();
        }
        self.narration = None;
        if let Some(detail) = self.detail.take() {
            self.view = detail.origin;
        }
    }

    pub fn detail_fact(&self) -> Option<&Fact> {
        self.detail.as_ref().map(|d| &d.fact)
    }

    pub fn scroll_detail(&mut self, delta: i32) {
        if let Some(detail) = self.detail.as_mut() {
            detail.scroll = if delta < 0 {
                detail.scroll.saturating_sub(delta.unsigned_abs() as u16)
            } else {
                detail.scroll.saturating_add(delta as u16)
            };
        }
    }

    #[must_use]
    pub fn toggle_narration(&mut self) -> Option<SpeechRequest> {
        self.narration.as_mut().and_then(|n| n.toggle())
    }

    pub fn pause_narration(&mut self) {
        if let Some(narration) = self.narration.as_mut() {
            narration.pause();
        }
    }

    pub fn on_speech_loaded(&mut self, fact_id: &str, loaded: SpeechLoaded) {
        let Some(narration) = self.narration.as_mut().filter(|n| n.fact_id() == fact_id) else {
            tracing::debug!(fact_id, "Discarding speech for a closed detail view");
            return;
        };
        if narration.on_speech_loaded(loaded) {
            self.speech_handle = None;
            if narration.phase() == NarrationPhase::Error {
                self.set_status(self.t(Key::TtsError));
            }
        }
    }

    pub fn on_playback_finished(&mut self, token: u64) {
        let finished = self
            .narration
            .as_mut()
            .is_some_and(|n| n.on_playback_finished(token));
        if !finished {
            tracing::debug!(token, "Ignoring completion of superseded playback");
        }
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    /// The fact the favorite key applies to in the current view.
    pub fn focused_fact(&self) -> Option<Fact> {
        match self.view {
            View::Detail => self.detail_fact().cloned(),
            View::Discovery => self.deck.current().cloned(),
            View::Favorites => self.selected_favorite().cloned(),
        }
    }

    pub async fn toggle_favorite(&mut self, fact: &Fact) -> Toggled {
        let toggled = self.favorites.toggle(fact).await;
        let msg = match toggled {
            Toggled::Added => i18n::tf(self.lang, Key::AddedToFavorites, &[fact.title.as_str()]),
            Toggled::Removed => i18n::tf(self.lang, Key::RemovedFromFavorites, &[fact.title.as_str()]),
        };
        self.set_status(msg);
        self.clamp_favorites_selection();
        toggled
    }

    pub fn show_favorites(&mut self) {
        self.close_detail();
        self.view = View::Favorites;
        self.clamp_favorites_selection();
    }

    pub fn displayed_favorites(&self) -> Vec<&Fact> {
        self.filter.displayed(self.favorites.list())
    }

    pub fn selected_favorite(&self) -> Option<&Fact> {
        self.displayed_favorites().get(self.favorites_selected).copied()
    }

    pub fn move_favorites_selection(&mut self, delta: isize) {
        let len = self.displayed_favorites().len();
        if len == 0 {
            self.favorites_selected = 0;
            return;
        }
        self.favorites_selected = self
            .favorites_selected
            .saturating_add_signed(delta)
            .min(len - 1);
    }

    pub fn clamp_favorites_selection(&mut self) {
        let len = self.displayed_favorites().len();
        self.favorites_selected = self.favorites_selected.min(len.saturating_sub(1));
    }

    /// Toggle the `slot`th category chip (1-based, in chip order).
    pub fn toggle_category_slot(&mut self, slot: usize) -> Option<Category> {
        let category = *self.favorites.categories().get(slot.checked_sub(1)?)?;
        self.filter.toggle_category(category);
        self.clamp_favorites_selection();
        Some(category)
    }

    pub fn clear_categories(&mut self) {
        self.filter.clear_categories();
        self.clamp_favorites_selection();
    }

    pub fn shuffle_favorites(&mut self) -> bool {
        if !self.filter.can_shuffle(self.favorites.list()) {
            return false;
        }
        self.filter.shuffle(self.favorites.list());
        self.favorites_selected = 0;
        self.set_status(self.t(Key::Shuffled));
        true
    }

    pub fn enter_search(&mut self) {
        self.search_mode = true;
    }

    pub fn search_push(&mut self, c: char) {
        if self.filter.query().chars().count() >= MAX_SEARCH_QUERY_LENGTH {
            return;
        }
        self.filter.push_query_char(c);
        self.favorites_selected = 0;
    }

    pub fn search_pop(&mut self) {
        self.filter.pop_query_char();
        self.favorites_selected = 0;
    }

    /// Leave search input. `keep` retains the typed query as the filter.
    pub fn exit_search(&mut self, keep: bool) {
        self.search_mode = false;
        if !keep {
            self.filter.set_query("");
        }
        self.clamp_favorites_selection();
    }

    // ========================================================================
    // Onboarding
    // ========================================================================

    /// Show the onboarding overlay unless it was completed before.
    pub async fn load_onboarding(&mut self, force: bool) {
        let complete = match &self.db {
            Some(db) => match db.get_flag(ONBOARDING_COMPLETE_KEY).await {
                Ok(flag) => flag.unwrap_or(false),
                Err(e) => {
                    tracing::warn!(error = %e, "Could not read onboarding flag");
                    false
                }
            },
            None => false,
        };
        if force || !complete {
            self.onboarding = Some(0);
        }
    }

    /// Advance one step. Returns true when the last step was passed.
    pub fn onboarding_next(&mut self) -> bool {
        match self.onboarding {
            Some(step) if step + 1 < ONBOARDING_STEPS.len() => {
                self.onboarding = Some(step + 1);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Dismiss the overlay and remember it. A storage failure still
    /// dismisses it for this session.
    pub async fn finish_onboarding(&mut self) {
        self.onboarding = None;
        if let Some(db) = &self.db {
            if let Err(e) = db.set_flag(ONBOARDING_COMPLETE_KEY, true).await {
                tracing::warn!(error = %e, "Failed to persist onboarding completion");
            }
        }
    }

    // ========================================================================
    // Covers
    // ========================================================================

    pub fn on_cover_warmed(
        &mut self,
        fact_id: String,
        result: Result<PathBuf, String>,
        open_when_ready: bool,
    ) -> Option<PathBuf> {
        match result {
            Ok(path) => {
                self.cover_paths.insert(fact_id, path.clone());
                open_when_ready.then_some(path)
            }
            Err(e) => {
                tracing::warn!(fact_id = %fact_id, error = %e, "Cover could not be cached");
                if open_when_ready {
                    self.set_status(self.t(Key::CoverOpenFailed));
                }
                None
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.batch_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.speech_handle.take() {
            handle.abort();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
