use async_trait::async_trait;
use thiserror::Error;

use crate::api::{
    Content, GenerateRequest, GenerateResponse, GenerationConfig, Part, ThinkingConfig,
};
use crate::core::message::{Attachment, Message};
use crate::utils::url::construct_api_url;

/// Sampling temperature for answer generation. Kept low so worked solutions
/// stay stable across retries of the same question.
pub const TEMPERATURE: f32 = 0.3;

/// Token budget for the model's reasoning pass.
pub const THINKING_BUDGET: i32 = 1024;

pub const SYSTEM_INSTRUCTION: &str = "You are a patient math tutor. Answer the user's question \
directly, showing the key steps. Use $...$ for inline math and $$...$$ for displayed equations.";

/// Answer substituted when the response contains no usable text at all.
/// Not an error: the call succeeded, the model just said nothing.
pub const EMPTY_REPLY_ANSWER: &str =
    "Sorry, I couldn't come up with an answer for that one. Could you rephrase the question?";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Remote { status: u16, message: String },
    #[error("response body was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no API key configured; set api_key in config.toml or the GEMINI_API_KEY variable")]
    MissingApiKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    pub answer: String,
    pub reasoning_trace: Option<String>,
}

/// Seam between the session controller and the remote reasoning model.
#[async_trait]
pub trait GenerateModel: Send + Sync {
    async fn generate(
        &self,
        history: &[Message],
        new_text: &str,
        attachments: &[Attachment],
    ) -> Result<ModelReply, ApiError>;
}

pub struct ModelClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ModelClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl GenerateModel for ModelClient {
    async fn generate(
        &self,
        history: &[Message],
        new_text: &str,
        attachments: &[Attachment],
    ) -> Result<ModelReply, ApiError> {
        let request = build_request(history, new_text, attachments);
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
                message: summarize_error_body(&body),
            });
        }

        let body = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&body)?;
        Ok(decompose(parsed))
    }
}

/// Assemble the wire request: the full history as role-tagged parts, then a
/// new user turn carrying the fresh text and one inline-data part per
/// attachment (data-URI prefix stripped, mime passed through).
pub fn build_request(
    history: &[Message],
    new_text: &str,
    attachments: &[Attachment],
) -> GenerateRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|message| Content {
            role: Some(message.role.to_api_role().to_string()),
            parts: vec![Part::text(&message.content)],
        })
        .collect();

    let mut parts = Vec::with_capacity(1 + attachments.len());
    if !new_text.is_empty() {
        parts.push(Part::text(new_text));
    }
    for attachment in attachments {
        parts.push(Part::inline_data(&attachment.mime, attachment.inline_payload()));
    }
    contents.push(Content::user(parts));

    GenerateRequest {
        contents,
        system_instruction: Some(Content::system(SYSTEM_INSTRUCTION)),
        generation_config: GenerationConfig {
            temperature: Some(TEMPERATURE),
            thinking_config: Some(ThinkingConfig {
                thinking_budget: THINKING_BUDGET,
                include_thoughts: true,
            }),
            ..GenerationConfig::default()
        },
    }
}

/// Split a response into the visible answer and the optional reasoning trace.
/// Parts arrive in arbitrary order; the first non-thought text part wins, the
/// top-level convenience field is the fallback, and a response with no usable
/// text yields the fixed apology answer.
pub fn decompose(response: GenerateResponse) -> ModelReply {
    let mut answer: Option<String> = None;
    let mut reasoning_trace: Option<String> = None;

    let parts = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| content.parts.as_slice())
        .unwrap_or_default();

    for part in parts {
        let Some(text) = part.text.as_deref() else {
            continue;
        };
        if part.thought {
            if reasoning_trace.is_none() {
                reasoning_trace = Some(text.to_string());
            }
        } else if answer.is_none() {
            answer = Some(text.to_string());
        }
    }

    let answer = answer
        .or(response.text)
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| EMPTY_REPLY_ANSWER.to_string());

    ModelReply {
        answer,
        reasoning_trace,
    }
}

/// Pull a human-readable summary out of an error body, which may be JSON with
/// a nested error object or arbitrary text.
fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let summary = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .or_else(|| value.get("message").and_then(|v| v.as_str()));
        if let Some(summary) = summary {
            let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
            if !collapsed.is_empty() {
                return collapsed;
            }
        }
    }
    trimmed.to_string()
}
