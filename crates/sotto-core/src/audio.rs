//! Audio format description and sample conversion

use serde::{Deserialize, Serialize};

/// Maximum magnitude of a signed 16-bit PCM sample
const PCM16_MAX_VALUE: f32 = 32768.0;

/// Sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    /// Signed little-endian PCM
    Pcm,
}

/// Audio stream parameters shared by recorders and ASR providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Sample encoding
    pub format: AudioFormat,
    /// Channel count
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bytes per sample
    pub sample_width: u16,
}

impl AudioInfo {
    /// Duration in seconds of `byte_len` bytes of raw audio in this format
    pub fn duration_secs(&self, byte_len: usize) -> f64 {
        let frame_bytes = self.channels as usize * self.sample_width as usize;
        if frame_bytes == 0 || self.sample_rate == 0 {
            return 0.0;
        }
        (byte_len / frame_bytes) as f64 / self.sample_rate as f64
    }
}

impl Default for AudioInfo {
    /// 16 kHz mono 16-bit PCM, what every bundled ASR model expects
    fn default() -> Self {
        Self {
            format: AudioFormat::Pcm,
            channels: 1,
            sample_rate: 16_000,
            sample_width: 2,
        }
    }
}

/// Convert 16-bit signed little-endian PCM to normalized `f32` samples.
///
/// A trailing odd byte is ignored.
pub fn pcm16_to_f32(data: &[u8]) -> Vec<f32> {
    data.chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / PCM16_MAX_VALUE)
        .collect()
}

/// RMS level of 16-bit PCM audio, clamped to [0.0, 1.0]
pub fn rms_level(data: &[u8]) -> f32 {
    let samples = pcm16_to_f32(data);
    if samples.is_empty() {
        return 0.0;
    }
    let sum_of_squares: f64 = samples.iter().map(|s| (*s as f64) * (*s as f64)).sum();
    (sum_of_squares / samples.len() as f64).sqrt().clamp(0.0, 1.0) as f32
}
