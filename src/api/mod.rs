//! Wire payloads for the remote generateContent-style API. One request shape
//! serves both the reasoning model and the speech model; the response is a
//! list of role-tagged content parts that may individually be flagged as
//! reasoning ("thought") output.

use serde::{Deserialize, Serialize};

pub mod client;

pub use client::{GenerateModel, ModelClient, ModelReply};

#[derive(Serialize, Debug, Clone)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    /// Set on parts carrying the model's reasoning trace.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub thought: bool,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
            ..Self::default()
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: i32,
    pub include_thoughts: bool,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Convenience plain-text field some responses carry alongside the parts.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_camel_case_keys() {
        let request = GenerateRequest {
            contents: vec![Content::user(vec![
                Part::text("What is 2+2?"),
                Part::inline_data("image/png", "AQID"),
            ])],
            system_instruction: Some(Content::system("Be brief.")),
            generation_config: GenerationConfig {
                temperature: Some(0.3),
                thinking_config: Some(ThinkingConfig {
                    thinking_budget: 1024,
                    include_thoughts: true,
                }),
                ..GenerationConfig::default()
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        // f32 widens to f64 through serde_json, so compare with a tolerance.
        let temperature = value["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.3).abs() < 1e-6);
        assert_eq!(
            value["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            1024
        );
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "Be brief.");
        // The thought flag is request-side noise and must not be emitted.
        assert!(value["contents"][0]["parts"][0].get("thought").is_none());
    }

    #[test]
    fn response_parses_thought_flag_and_convenience_text() {
        let raw = r#"{
            "candidates": [{"content": {"role": "model", "parts": [
                {"text": "chain of steps", "thought": true},
                {"text": "x = 4"}
            ]}}],
            "text": "x = 4"
        }"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        let parts = &response.candidates[0].content.as_ref().unwrap().parts;
        assert!(parts[0].thought);
        assert!(!parts[1].thought);
        assert_eq!(response.text.as_deref(), Some("x = 4"));
    }
}
