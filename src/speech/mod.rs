//! Text-to-speech: remote synthesis plus PCM decoding into playable samples.
//!
//! The pipeline is deliberately forgiving. A response with no audio payload
//! is `None`, not an error; only transport problems surface as [`ApiError`],
//! and callers downgrade those to `None` after logging. Actual audio-device
//! playback is the caller's job.

pub mod pcm;
pub mod recognition;

use std::path::Path;

use async_trait::async_trait;
use tracing::warn;

use crate::api::client::ApiError;
use crate::api::{
    Content, GenerateRequest, GenerateResponse, GenerationConfig, Part, PrebuiltVoiceConfig,
    SpeechConfig, VoiceConfig,
};
use crate::utils::url::construct_api_url;

/// Instructional framing prepended to every synthesis request.
pub const SPEECH_PROMPT_PREFIX: &str =
    "Read this math explanation aloud in a clear, friendly voice: ";

/// Decoded, playback-ready audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Export as a 16-bit mono WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for sample in pcm::f32_to_pcm16(&self.samples) {
            writer.write_sample(sample)?;
        }
        writer.finalize()
    }
}

/// Seam between callers and the remote speech service.
#[async_trait]
pub trait SpeechModel: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Option<AudioClip>, ApiError>;
}

pub struct SpeechClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
}

impl SpeechClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        voice: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            voice: voice.into(),
        }
    }
}

#[async_trait]
impl SpeechModel for SpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Option<AudioClip>, ApiError> {
        let request = build_speech_request(text, &self.voice);
        let url = construct_api_url(
            &self.base_url,
            &format!("models/{}:generateContent", self.model),
        );

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<no body>".into());
            return Err(ApiError::Remote {
                status: status.as_u16(),
                message: body.trim().to_string(),
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&response.text().await?)?;
        Ok(extract_audio(parsed))
    }
}

/// One user turn with the fixed instructional prefix, audio-only response
/// modality, and a single named voice.
pub fn build_speech_request(text: &str, voice: &str) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content::user(vec![Part::text(format!(
            "{SPEECH_PROMPT_PREFIX}{text}"
        ))])],
        system_instruction: None,
        generation_config: GenerationConfig {
            response_modalities: Some(vec!["AUDIO".to_string()]),
            speech_config: Some(SpeechConfig {
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig {
                        voice_name: voice.to_string(),
                    },
                },
            }),
            ..GenerationConfig::default()
        },
    }
}

/// Pull the single base64 PCM payload out of a response, if there is one.
/// Undecodable payloads count as missing.
pub fn extract_audio(response: GenerateResponse) -> Option<AudioClip> {
    let data = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .and_then(|content| content.parts.iter().find_map(|p| p.inline_data.as_ref()))
        .map(|inline| inline.data.as_str())?;

    match pcm::decode_base64_pcm(data) {
        Ok(samples) => Some(AudioClip {
            samples,
            sample_rate: pcm::SAMPLE_RATE,
        }),
        Err(e) => {
            warn!("discarding undecodable audio payload: {e}");
            None
        }
    }
}
