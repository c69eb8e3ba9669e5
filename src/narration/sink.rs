//! Audio output seam.
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::audio::AudioBuffer;

/// Where narration audio goes.
///
/// `start` begins playing `buffer` from `offset`. When playback reaches the
/// end on its own, the sink reports `token` back to whoever owns the
/// controller. `stop` must guarantee that no completion for the current
/// playback is reported afterwards.
pub trait AudioSink {
    fn start(&mut self, buffer: Arc<AudioBuffer>, offset: Duration, token: u64);
    fn stop(&mut self);
    /// Release the output. The sink is not used again.
    fn close(&mut self);
}

/// Callback invoked with the playback token on natural completion.
pub type FinishedCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Sink that produces no sound and models playback with the tokio clock.
///
/// Completion fires once the remaining buffer duration has elapsed.
pub struct ClockSink {
    on_finished: FinishedCallback,
    playing: Option<JoinHandle<()>>,
    closed: bool,
}

impl ClockSink {
    /// Must be used from inside a tokio runtime.
    pub fn new(on_finished: FinishedCallback) -> Self {
        Self {
            on_finished,
            playing: None,
            closed: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl AudioSink for ClockSink {
    fn start(&mut self, buffer: Arc<AudioBuffer>, offset: Duration, token: u64) {
        self.stop();
        if self.closed {
            tracing::debug!(token, "Ignoring start on closed sink");
            return;
        }
        let remaining = buffer.duration().saturating_sub(offset);
        let on_finished = Arc::clone(&self.on_finished);
        self.playing = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            on_finished(token);
        }));
    }

    fn stop(&mut self) {
        if let Some(handle) = self.playing.take() {
            handle.abort();
        }
    }

    fn close(&mut self) {
        self.stop();
        self.closed = true;
    }
}

impl Drop for ClockSink {
    fn drop(&mut self) {
        self.stop();
    }
}
