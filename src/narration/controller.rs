//! Narration state machine for one fact.
//!
//! ```text
//! Idle/Error --play--> Loading --loaded--> Playing --pause--> Paused
//!                         |                   |                 |
//!                         +--failed--> Error  +--finished--> Idle
//!                                             ^------play-------+
//! ```
//!
//! The controller never awaits. `play` hands back a [`SpeechRequest`] for the
//! caller to run in the background; the result comes back through
//! [`NarrationController::on_speech_loaded`].
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::ambient::TtsFlag;
use super::audio::{decode_audio_data, AudioBuffer, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE};
use super::sink::AudioSink;
use super::NarrationError;
use crate::content::ContentProvider;
use crate::model::Fact;

// Unique across every controller, so a result or completion can never be
// mistaken for one belonging to another fact.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

fn next_token() -> u64 {
    NEXT_TOKEN.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone)]
pub enum NarrationState {
    Idle,
    Loading {
        /// Pause was pressed before the audio arrived.
        pause_requested: bool,
    },
    Playing {
        buffer: Arc<AudioBuffer>,
        started_at: Instant,
        offset: Duration,
        token: u64,
    },
    Paused {
        buffer: Arc<AudioBuffer>,
        offset: Duration,
    },
    Error {
        reason: String,
    },
}

/// Payload-free view of [`NarrationState`] for rendering and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationPhase {
    Idle,
    Loading,
    Playing,
    Paused,
    Error,
}

impl NarrationState {
    pub fn phase(&self) -> NarrationPhase {
        match self {
            Self::Idle => NarrationPhase::Idle,
            Self::Loading { .. } => NarrationPhase::Loading,
            Self::Playing { .. } => NarrationPhase::Playing,
            Self::Paused { .. } => NarrationPhase::Paused,
            Self::Error { .. } => NarrationPhase::Error,
        }
    }
}

/// Speech synthesis work handed out by [`NarrationController::play`].
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub generation: u64,
    pub text: String,
}

impl SpeechRequest {
    /// Fetch and decode the audio.
    pub async fn run<P: ContentProvider + ?Sized>(self, provider: &P) -> SpeechLoaded {
        let result = match provider.generate_speech(&self.text).await {
            Ok(bytes) => decode_audio_data(&bytes, SPEECH_SAMPLE_RATE, SPEECH_CHANNELS).map(Arc::new),
            Err(e) => Err(NarrationError::Provider(e)),
        };
        SpeechLoaded {
            generation: self.generation,
            result,
        }
    }
}

#[derive(Debug)]
pub struct SpeechLoaded {
    pub generation: u64,
    pub result: Result<Arc<AudioBuffer>, NarrationError>,
}

pub struct NarrationController<S: AudioSink> {
    fact_id: String,
    text: String,
    state: NarrationState,
    cached: Option<Arc<AudioBuffer>>,
    /// Generation of the outstanding speech request, if any.
    pending: Option<u64>,
    sink: S,
    tts: TtsFlag,
}

impl<S: AudioSink> NarrationController<S> {
    pub fn new(fact: &Fact, sink: S, tts: TtsFlag) -> Self {
        Self {
            fact_id: fact.id.clone(),
            text: fact.narration_text(),
            state: NarrationState::Idle,
            cached: None,
            pending: None,
            sink,
            tts,
        }
    }

    pub fn fact_id(&self) -> &str {
        &self.fact_id
    }

    pub fn state(&self) -> &NarrationState {
        &self.state
    }

    pub fn phase(&self) -> NarrationPhase {
        self.state.phase()
    }

    pub fn has_cached_audio(&self) -> bool {
        self.cached.is_some()
    }

    /// Playback position: live while playing, frozen while paused.
    pub fn position(&self) -> Duration {
        match &self.state {
            NarrationState::Playing {
                buffer,
                started_at,
                offset,
                ..
            } => (*offset + started_at.elapsed()).min(buffer.duration()),
            NarrationState::Paused { offset, .. } => *offset,
            _ => Duration::ZERO,
        }
    }

    /// Play pressed.
    ///
    /// Returns a request when audio has to be fetched first. Ignored while
    /// loading or already playing.
    #[must_use]
    pub fn play(&mut self) -> Option<SpeechRequest> {
        match &self.state {
            NarrationState::Loading { .. } | NarrationState::Playing { .. } => None,
            NarrationState::Paused { buffer, offset } => {
                let (buffer, offset) = (Arc::clone(buffer), *offset);
                self.start(buffer, offset);
                None
            }
            NarrationState::Idle | NarrationState::Error { .. } => {
                if let Some(buffer) = self.cached.clone() {
                    self.start(buffer, Duration::ZERO);
                    return None;
                }
                let generation = next_generation();
                self.pending = Some(generation);
                self.state = NarrationState::Loading {
                    pause_requested: false,
                };
                self.tts.set(true);
                tracing::debug!(fact_id = %self.fact_id, generation, "Requesting narration audio");
                Some(SpeechRequest {
                    generation,
                    text: self.text.clone(),
                })
            }
        }
    }

    /// Pause pressed.
    pub fn pause(&mut self) {
        let offset = self.position();
        match &mut self.state {
            NarrationState::Loading { pause_requested } => {
                *pause_requested = true;
            }
            NarrationState::Playing { buffer, .. } => {
                let buffer = Arc::clone(buffer);
                // Replacing the state drops the token before the sink stops.
                self.state = NarrationState::Paused { buffer, offset };
                self.sink.stop();
                self.tts.set(false);
            }
            _ => {}
        }
    }

    /// The single play/pause control.
    #[must_use]
    pub fn toggle(&mut self) -> Option<SpeechRequest> {
        match self.state {
            NarrationState::Playing { .. }
            | NarrationState::Loading {
                pause_requested: false,
            } => {
                self.pause();
                None
            }
            _ => self.play(),
        }
    }

    /// Apply a finished speech request. Returns false for stale results.
    pub fn on_speech_loaded(&mut self, loaded: SpeechLoaded) -> bool {
        let NarrationState::Loading { pause_requested } = self.state else {
            tracing::debug!(generation = loaded.generation, "Discarding speech result, not loading");
            return false;
        };
        if self.pending != Some(loaded.generation) {
            tracing::debug!(generation = loaded.generation, "Discarding stale speech result");
            return false;
        }
        self.pending = None;

        match loaded.result {
            Ok(buffer) => {
                tracing::debug!(
                    fact_id = %self.fact_id,
                    seconds = buffer.duration().as_secs_f32(),
                    "Narration audio ready"
                );
                self.cached = Some(Arc::clone(&buffer));
                if pause_requested {
                    self.state = NarrationState::Paused {
                        buffer,
                        offset: Duration::ZERO,
                    };
                    self.tts.set(false);
                } else {
                    self.start(buffer, Duration::ZERO);
                }
            }
            Err(e) => {
                tracing::warn!(fact_id = %self.fact_id, error = %e, "Narration failed");
                self.state = NarrationState::Error {
                    reason: e.to_string(),
                };
                self.tts.set(false);
            }
        }
        true
    }

    /// The sink reached the end of the buffer. Returns false if `token`
    /// does not belong to the current playback.
    pub fn on_playback_finished(&mut self, token: u64) -> bool {
        match self.state {
            NarrationState::Playing { token: current, .. } if current == token => {
                self.state = NarrationState::Idle;
                self.tts.set(false);
                true
            }
            _ => false,
        }
    }

    fn start(&mut self, buffer: Arc<AudioBuffer>, offset: Duration) {
        self.sink.stop();
        let token = next_token();
        self.sink.start(Arc::clone(&buffer), offset, token);
        self.state = NarrationState::Playing {
            buffer,
            started_at: Instant::now(),
            offset,
            token,
        };
        self.tts.set(true);
    }
}

impl<S: AudioSink> Drop for NarrationController<S> {
    fn drop(&mut self) {
        self.sink.stop();
        self.sink.close();
        self.tts.set(false);
    }
}

impl<S: AudioSink> std::fmt::Debug for NarrationController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationController")
            .field("fact_id", &self.fact_id)
            .field("phase", &self.phase())
            .field("cached", &self.cached.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum SinkCall {
        Start { offset: Duration, token: u64 },
        Stop,
        Close,
    }

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<SinkCall>>>);

    impl RecordingSink {
        fn starts(&self) -> Vec<(Duration, u64)> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter_map(|c| match c {
                    SinkCall::Start { offset, token } => Some((*offset, *token)),
                    _ => None,
                })
                .collect()
        }
    }

    impl AudioSink for RecordingSink {
        fn start(&mut self, _buffer: Arc<AudioBuffer>, offset: Duration, token: u64) {
            self.0.lock().unwrap().push(SinkCall::Start { offset, token });
        }
        fn stop(&mut self) {
            self.0.lock().unwrap().push(SinkCall::Stop);
        }
        fn close(&mut self) {
            self.0.lock().unwrap().push(SinkCall::Close);
        }
    }

    fn fact() -> Fact {
        Fact {
            id: "f1".into(),
            title: "Borley Rectory".into(),
            summary: "The most haunted house in England".into(),
            details: "Built in 1862.".into(),
            category: Category::Ghost,
            video_url: String::new(),
            image_url: None,
        }
    }

    fn buffer(seconds: usize) -> Arc<AudioBuffer> {
        Arc::new(AudioBuffer {
            samples: vec![0.0; 24_000 * seconds],
            sample_rate: 24_000,
            channels: 1,
        })
    }

    fn controller() -> (NarrationController<RecordingSink>, RecordingSink, TtsFlag) {
        let sink = RecordingSink::default();
        let tts = TtsFlag::new();
        (NarrationController::new(&fact(), sink.clone(), tts.clone()), sink, tts)
    }

    fn ok(generation: u64, seconds: usize) -> SpeechLoaded {
        SpeechLoaded {
            generation,
            result: Ok(buffer(seconds)),
        }
    }

    #[test]
    fn test_play_from_idle_requests_audio() {
        let (mut ctl, _sink, tts) = controller();
        let req = ctl.play().expect("request");
        assert_eq!(req.text, "Borley Rectory. Built in 1862.");
        assert_eq!(ctl.phase(), NarrationPhase::Loading);
        assert!(tts.is_active());
    }

    #[test]
    fn test_play_while_loading_is_ignored() {
        let (mut ctl, _sink, _tts) = controller();
        let _ = ctl.play();
        assert!(ctl.play().is_none());
        assert_eq!(ctl.phase(), NarrationPhase::Loading);
    }

    #[tokio::test]
    async fn test_loaded_audio_starts_at_zero() {
        let (mut ctl, sink, tts) = controller();
        let req = ctl.play().unwrap();
        assert!(ctl.on_speech_loaded(ok(req.generation, 3)));
        assert_eq!(ctl.phase(), NarrationPhase::Playing);
        assert_eq!(sink.starts().len(), 1);
        assert_eq!(sink.starts()[0].0, Duration::ZERO);
        assert!(tts.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_records_offset_and_resume_uses_it() {
        let (mut ctl, sink, tts) = controller();
        let req = ctl.play().unwrap();
        ctl.on_speech_loaded(ok(req.generation, 10));

        tokio::time::advance(Duration::from_millis(1500)).await;
        ctl.pause();
        assert_eq!(ctl.phase(), NarrationPhase::Paused);
        assert_eq!(ctl.position(), Duration::from_millis(1500));
        assert!(!tts.is_active());

        assert!(ctl.play().is_none());
        assert_eq!(ctl.phase(), NarrationPhase::Playing);
        let starts = sink.starts();
        assert_eq!(starts.len(), 2);
        assert_eq!(starts[1].0, Duration::from_millis(1500));
        assert_ne!(starts[0].1, starts[1].1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_is_clamped_to_duration() {
        let (mut ctl, _sink, _tts) = controller();
        let req = ctl.play().unwrap();
        ctl.on_speech_loaded(ok(req.generation, 1));
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(ctl.position(), Duration::from_secs(1));
    }

    #[test]
    fn test_pause_during_loading_lands_in_paused() {
        let (mut ctl, sink, tts) = controller();
        let req = ctl.play().unwrap();
        ctl.pause();
        assert_eq!(ctl.phase(), NarrationPhase::Loading);

        ctl.on_speech_loaded(ok(req.generation, 2));
        assert_eq!(ctl.phase(), NarrationPhase::Paused);
        assert_eq!(ctl.position(), Duration::ZERO);
        assert!(sink.starts().is_empty());
        assert!(!tts.is_active());
        assert!(ctl.has_cached_audio());
    }

    #[test]
    fn test_failure_goes_to_error_and_retry_refetches() {
        let (mut ctl, _sink, tts) = controller();
        let req = ctl.play().unwrap();
        ctl.on_speech_loaded(SpeechLoaded {
            generation: req.generation,
            result: Err(NarrationError::DecodeFailed("bad".into())),
        });
        assert_eq!(ctl.phase(), NarrationPhase::Error);
        assert!(!tts.is_active());

        let retry = ctl.play().expect("error state refetches");
        assert_ne!(retry.generation, req.generation);
        assert_eq!(ctl.phase(), NarrationPhase::Loading);
    }

    #[tokio::test]
    async fn test_natural_completion_returns_to_idle_and_reuses_cache() {
        let (mut ctl, sink, tts) = controller();
        let req = ctl.play().unwrap();
        ctl.on_speech_loaded(ok(req.generation, 1));
        let token = sink.starts()[0].1;

        assert!(ctl.on_playback_finished(token));
        assert_eq!(ctl.phase(), NarrationPhase::Idle);
        assert!(!tts.is_active());

        assert!(ctl.play().is_none(), "cached buffer is reused");
        assert_eq!(ctl.phase(), NarrationPhase::Playing);
        assert_eq!(sink.starts()[1].0, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_stale_completion_after_pause_is_ignored() {
        let (mut ctl, sink, _tts) = controller();
        let req = ctl.play().unwrap();
        ctl.on_speech_loaded(ok(req.generation, 1));
        let token = sink.starts()[0].1;

        ctl.pause();
        assert!(!ctl.on_playback_finished(token));
        assert_eq!(ctl.phase(), NarrationPhase::Paused);

        let _ = ctl.play();
        assert!(!ctl.on_playback_finished(token));
        assert_eq!(ctl.phase(), NarrationPhase::Playing);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let (mut ctl, _sink, _tts) = controller();
        let req = ctl.play().unwrap();
        assert!(!ctl.on_speech_loaded(ok(req.generation + 1000, 1)));
        assert_eq!(ctl.phase(), NarrationPhase::Loading);
    }

    #[test]
    fn test_result_for_other_controller_is_discarded() {
        let (mut a, _sa, _ta) = controller();
        let (mut b, _sb, _tb) = controller();
        let req_a = a.play().unwrap();
        let _req_b = b.play().unwrap();
        assert!(!b.on_speech_loaded(ok(req_a.generation, 1)));
        assert_eq!(b.phase(), NarrationPhase::Loading);
    }

    #[test]
    fn test_toggle_cycles() {
        let (mut ctl, _sink, _tts) = controller();
        let req = ctl.toggle().expect("first toggle plays");
        assert!(ctl.toggle().is_none());
        assert_eq!(ctl.phase(), NarrationPhase::Loading);
        // Pause already requested: toggling again asks to play, which is ignored while loading.
        assert!(ctl.toggle().is_none());
        ctl.on_speech_loaded(ok(req.generation, 1));
        assert_eq!(ctl.phase(), NarrationPhase::Paused);
    }

    #[test]
    fn test_drop_stops_closes_and_clears_flag() {
        let (mut ctl, sink, tts) = controller();
        let _ = ctl.play();
        assert!(tts.is_active());
        drop(ctl);
        let calls = sink.0.lock().unwrap().clone();
        assert_eq!(&calls[calls.len() - 2..], &[SinkCall::Stop, SinkCall::Close]);
        assert!(!tts.is_active());
    }
}
