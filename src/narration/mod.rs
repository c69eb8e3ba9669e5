//! Read-aloud narration for the detail view.
pub mod ambient;
pub mod audio;
pub mod controller;
pub mod sink;

use thiserror::Error;

use crate::content::ProviderError;

pub use ambient::{AmbientAudio, TtsFlag};
pub use audio::{decode_audio_data, AudioBuffer, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE};
pub use controller::{NarrationController, NarrationPhase, NarrationState, SpeechLoaded, SpeechRequest};
pub use sink::{AudioSink, ClockSink, FinishedCallback};

#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("speech request failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("could not decode speech audio: {0}")]
    DecodeFailed(String),
}
