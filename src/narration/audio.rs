//! Decoding of provider speech audio.
use std::time::Duration;

use super::NarrationError;

/// Sample rate of the PCM returned by the speech model.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;
/// The speech model returns mono audio.
pub const SPEECH_CHANNELS: u16 = 1;

/// Decoded, playable audio. Samples are interleaved when `channels > 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBuffer {
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }
}

/// Convert raw 16-bit little-endian PCM into an [`AudioBuffer`].
///
/// # Errors
///
/// `NarrationError::DecodeFailed` when the data is empty, the format is
/// degenerate, or the byte count is not a whole number of frames.
pub fn decode_audio_data(
    bytes: &[u8],
    sample_rate: u32,
    channels: u16,
) -> Result<AudioBuffer, NarrationError> {
    if sample_rate == 0 || channels == 0 {
        return Err(NarrationError::DecodeFailed(format!(
            "invalid format: {sample_rate} Hz, {channels} channel(s)"
        )));
    }
    if bytes.is_empty() {
        return Err(NarrationError::DecodeFailed("empty audio data".to_string()));
    }
    let frame_bytes = 2 * usize::from(channels);
    if bytes.len() % frame_bytes != 0 {
        return Err(NarrationError::DecodeFailed(format!(
            "{} bytes is not a whole number of {frame_bytes}-byte frames",
            bytes.len()
        )));
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32768.0)
        .collect();

    Ok(AudioBuffer {
        samples,
        sample_rate,
        channels,
    })
}
