//! Background music mute state.
//!
//! The music is muted when the user asked for it or while narration is
//! loading or playing.
use std::sync::Arc;

use tokio::sync::watch;

/// Shared "narration active" flag written by narration controllers.
#[derive(Debug, Clone)]
pub struct TtsFlag {
    tx: Arc<watch::Sender<bool>>,
}

impl TtsFlag {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn set(&self, active: bool) {
        self.tx.send_if_modified(|current| {
            let changed = *current != active;
            *current = active;
            changed
        });
    }

    pub fn is_active(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for TtsFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct AmbientAudio {
    user_muted: bool,
    tts: TtsFlag,
}

impl AmbientAudio {
    pub fn new(start_muted: bool) -> Self {
        Self {
            user_muted: start_muted,
            tts: TtsFlag::new(),
        }
    }

    /// Handle given to narration controllers.
    pub fn tts_flag(&self) -> TtsFlag {
        self.tts.clone()
    }

    pub fn user_muted(&self) -> bool {
        self.user_muted
    }

    /// Flip the user's mute preference and return the new value.
    pub fn toggle_mute(&mut self) -> bool {
        self.user_muted = !self.user_muted;
        tracing::debug!(muted = self.user_muted, "Background music mute toggled");
        self.user_muted
    }

    pub fn narration_active(&self) -> bool {
        self.tts.is_active()
    }

    pub fn effective_muted(&self) -> bool {
        self.user_muted || self.narration_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_mute_is_logical_or() {
        for user in [false, true] {
            for tts in [false, true] {
                let mut ambient = AmbientAudio::new(false);
                if user {
                    ambient.toggle_mute();
                }
                ambient.tts_flag().set(tts);
                assert_eq!(ambient.effective_muted(), user || tts);
            }
        }
    }

    #[test]
    fn test_start_muted() {
        let ambient = AmbientAudio::new(true);
        assert!(ambient.user_muted());
        assert!(ambient.effective_muted());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let flag = TtsFlag::new();
        let mut rx = flag.subscribe();
        flag.set(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());

        // Writing the same value does not notify.
        flag.set(true);
        assert!(!rx.has_changed().unwrap());
    }
}
