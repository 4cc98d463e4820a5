//! Raw PCM decoding for speech payloads.
//!
//! The speech service returns base64 of headerless little-endian signed
//! 16-bit mono PCM at 24 kHz. Samples are rescaled into `[-1.0, 1.0)` floats
//! for playback.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Sample rate of every payload the speech service produces.
pub const SAMPLE_RATE: u32 = 24_000;

pub fn decode_base64_pcm(data: &str) -> Result<Vec<f32>, base64::DecodeError> {
    Ok(pcm16_to_f32(&BASE64.decode(data)?))
}

/// Interpret bytes as s16le samples and normalize. A dangling odd byte is
/// dropped.
pub fn pcm16_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

pub fn f32_to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect()
}
