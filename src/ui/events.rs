//! Application event handling.
//!
//! Applies results from background tasks (batch progress, speech audio,
//! playback completion, cover warming) to the app state.

use crate::app::{App, AppEvent};

use super::helpers::open_cover_file;

/// Handle one event from a background task.
///
/// Staleness is decided by the app: events from superseded batches or for
/// closed detail views are logged and dropped there.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Batch { generation, event } => {
            app.on_batch_event(generation, event);
        }
        AppEvent::BatchFinished { generation, result } => {
            app.on_batch_finished(generation, result);
        }
        AppEvent::SpeechLoaded { fact_id, loaded } => {
            app.on_speech_loaded(&fact_id, loaded);
        }
        AppEvent::PlaybackFinished { token } => {
            app.on_playback_finished(token);
        }
        AppEvent::CoverWarmed {
            fact_id,
            result,
            open_when_ready,
        } => {
            if let Some(path) = app.on_cover_warmed(fact_id, result, open_when_ready) {
                open_cover_file(app, &path);
            }
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error, "Background task panicked");
            app.set_status(format!("Internal error in {} task", task));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{BatchMode, BatchState};
    use crate::config::Config;
    use crate::favorites::FavoritesStore;
    use crate::loader::{BatchEvent, BatchReport, BatchStatus};
    use crate::model::Language;

    fn app() -> App {
        App::new(&Config::default(), Language::En, FavoritesStore::detached(), None)
    }

    #[tokio::test]
    async fn test_batch_progress_updates_state() {
        let mut app = app();
        let generation = app.begin_batch(BatchMode::Replace);
        handle_app_event(
            &mut app,
            AppEvent::Batch {
                generation,
                event: BatchEvent::Status(BatchStatus::FetchingImages { done: 1, total: 5 }),
            },
        );
        assert_eq!(
            app.batch,
            BatchState::Loading(BatchStatus::FetchingImages { done: 1, total: 5 })
        );

        handle_app_event(
            &mut app,
            AppEvent::BatchFinished {
                generation,
                result: Ok(BatchReport::default()),
            },
        );
        assert_eq!(app.batch, BatchState::Idle);
    }

    #[tokio::test]
    async fn test_task_panic_sets_status() {
        let mut app = app();
        handle_app_event(
            &mut app,
            AppEvent::TaskPanicked {
                task: "batch",
                error: "boom".to_string(),
            },
        );
        let status = app.status_message.as_ref().map(|(m, _)| m.to_string());
        assert_eq!(status.as_deref(), Some("Internal error in batch task"));
    }

    #[tokio::test]
    async fn test_unrelated_playback_completion_is_ignored() {
        let mut app = app();
        handle_app_event(&mut app, AppEvent::PlaybackFinished { token: 99 });
        assert!(app.narration.is_none());
    }
}
