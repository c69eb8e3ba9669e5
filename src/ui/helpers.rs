//! Helper functions for UI operations.
//!
//! Background task spawning lives here. Every task reports back through the
//! `AppEvent` channel and is wrapped in [`catch_task_panic`] so a panic shows
//! up as an event instead of a silently vanished task.

use crate::app::{App, AppEvent, BatchMode};
use crate::content::ContentProvider;
use crate::i18n::Key;
use crate::loader::load_batch;
use crate::model::Fact;
use crate::narration::{FinishedCallback, SpeechRequest};
use crate::share::share_text;
use crate::util::validate_url_for_open;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Wraps a future to catch panics and convert them to errors.
///
/// - `Ok(result)` if the future completes normally
/// - `Err(panic_message)` if the future panics
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else if let Some(e) = panic.downcast_ref::<Box<dyn std::error::Error + Send>>() {
                e.to_string()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

async fn report_panic(tx: &mpsc::Sender<AppEvent>, task: &'static str, error: String) {
    tracing::error!(task, error = %error, "Background task panicked");
    if tx.send(AppEvent::TaskPanicked { task, error }).await.is_err() {
        tracing::warn!(task, "Failed to report panic (receiver dropped)");
    }
}

// ============================================================================
// Batch Loading
// ============================================================================

/// Start a batch in the current language, superseding any running one.
pub(super) fn start_batch<P>(
    app: &mut App,
    mode: BatchMode,
    provider: &Arc<P>,
    event_tx: &mpsc::Sender<AppEvent>,
) where
    P: ContentProvider + 'static,
{
    let generation = app.begin_batch(mode);
    let lang = app.lang;
    let provider = Arc::clone(provider);
    let tx = event_tx.clone();

    app.batch_handle = Some(tokio::spawn(async move {
        let work = async {
            // The loader reports synchronously; progress is buffered here and
            // forwarded in order while the batch keeps running.
            let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
            let load = load_batch(provider.as_ref(), lang, move |event| {
                let _ = progress_tx.send(event);
            });
            tokio::pin!(load);

            let result = loop {
                tokio::select! {
                    biased;
                    Some(event) = progress_rx.recv() => {
                        if tx.send(AppEvent::Batch { generation, event }).await.is_err() {
                            return;
                        }
                    }
                    result = &mut load => break result,
                }
            };
            while let Ok(event) = progress_rx.try_recv() {
                if tx.send(AppEvent::Batch { generation, event }).await.is_err() {
                    return;
                }
            }
            if let Err(e) = tx.send(AppEvent::BatchFinished { generation, result }).await {
                tracing::warn!(error = %e, "Failed to send batch result (receiver dropped)");
            }
        };
        if let Err(panic_msg) = catch_task_panic(work).await {
            report_panic(&tx, "batch", panic_msg).await;
        }
    }));
}

// ============================================================================
// Narration
// ============================================================================

/// Callback handed to the audio sink; completions re-enter the UI loop as events.
pub(super) fn playback_callback(event_tx: &mpsc::Sender<AppEvent>) -> FinishedCallback {
    let tx = event_tx.clone();
    Arc::new(move |token| match tx.try_send(AppEvent::PlaybackFinished { token }) {
        Ok(()) => {}
        // Completions must never be dropped; wait for room
        Err(TrySendError::Full(event)) => {
            let tx = tx.clone();
            tokio::spawn(async move {
                if tx.send(event).await.is_err() {
                    tracing::warn!(token, "Failed to deliver playback completion (receiver dropped)");
                }
            });
        }
        Err(TrySendError::Closed(_)) => {
            tracing::warn!(token, "Failed to deliver playback completion (receiver dropped)");
        }
    })
}

pub(super) fn spawn_speech<P>(
    app: &mut App,
    request: SpeechRequest,
    provider: &Arc<P>,
    event_tx: &mpsc::Sender<AppEvent>,
) where
    P: ContentProvider + 'static,
{
    let Some(fact_id) = app.narration.as_ref().map(|n| n.fact_id().to_string()) else {
        return;
    };
    if let Some(handle) = app.speech_handle.take() {
        handle.abort();
    }
    let provider = Arc::clone(provider);
    let tx = event_tx.clone();

    app.speech_handle = Some(tokio::spawn(async move {
        match catch_task_panic(request.run(provider.as_ref())).await {
            Ok(loaded) => {
                if let Err(e) = tx.send(AppEvent::SpeechLoaded { fact_id, loaded }).await {
                    tracing::warn!(error = %e, "Failed to send speech result (receiver dropped)");
                }
            }
            Err(panic_msg) => report_panic(&tx, "speech", panic_msg).await,
        }
    }));
}

// ============================================================================
// Covers
// ============================================================================

/// Write the cover of `fact` to the on-disk cache in the background.
///
/// Returns false when there is nothing to warm.
pub(super) fn warm_cover(
    app: &App,
    fact: &Fact,
    open_when_ready: bool,
    event_tx: &mpsc::Sender<AppEvent>,
) -> bool {
    let (Some(cache), Some(image_url)) = (app.covers.clone(), fact.image_url.clone()) else {
        return false;
    };
    let fact_id = fact.id.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        match catch_task_panic(async { cache.warm(&image_url).await }).await {
            Ok(result) => {
                let event = AppEvent::CoverWarmed {
                    fact_id,
                    result: result.map_err(|e| e.to_string()),
                    open_when_ready,
                };
                if let Err(e) = tx.send(event).await {
                    tracing::warn!(error = %e, "Failed to send cover result (receiver dropped)");
                }
            }
            Err(panic_msg) => report_panic(&tx, "cover", panic_msg).await,
        }
    });
    true
}

/// Copy `fact` to the system clipboard in the current language.
pub(super) fn share_fact(app: &mut App, fact: &Fact) {
    let text = share_text(app.lang, fact);
    match app.clipboard.copy(&text) {
        Ok(()) => app.set_status(app.t(Key::CopySuccess)),
        Err(e) => {
            tracing::warn!(fact_id = %fact.id, error = %e, "Failed to copy fact to clipboard");
            app.set_status(app.t(Key::CopyFail));
        }
    }
}

/// Open a cached cover with the system image viewer.
pub(super) fn open_cover_file(app: &mut App, path: &Path) {
    match open::that(path) {
        Ok(()) => app.set_status(app.t(Key::CoverReady)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to open cover");
            app.set_status(app.t(Key::CoverOpenFailed));
        }
    }
}

/// Open the video of `fact` in the system browser.
pub(super) fn open_video(app: &mut App, fact: &Fact) {
    let Some(url) = crate::content::video::watch_url(&fact.video_url) else {
        app.set_status(app.t(Key::NoVideo));
        return;
    };
    // SEC: Validate URL before opening in browser
    let result = validate_url_for_open(&url)
        .map_err(|e| e.to_string())
        .and_then(|validated| open::that(validated.as_str()).map_err(|e| e.to_string()));
    if let Err(e) = result {
        tracing::warn!(url = %url, error = %e, "Failed to open video");
        app.set_status(app.t(Key::VideoOpenFailed));
    }
}
