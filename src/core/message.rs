use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Largest attachment accepted at the ingestion boundary, in raw bytes.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Role tag used on the wire. The remote API only distinguishes the
    /// model's own turns from everything else.
    pub fn to_api_role(self) -> &'static str {
        match self {
            Role::Assistant => "model",
            Role::User | Role::System => "user",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_assistant(self) -> bool {
        self == Role::Assistant
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("attachment '{name}' is {size} bytes, which exceeds the {MAX_ATTACHMENT_BYTES}-byte limit")]
    TooLarge { name: String, size: usize },
    #[error("failed to read attachment: {0}")]
    Io(#[from] std::io::Error),
}

/// A user-supplied file carried on a single message. The payload is stored as
/// a `data:<mime>;base64,` URI so the transcript is self-contained; the
/// prefix is stripped again before transmission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub mime: String,
    pub payload: String,
}

impl Attachment {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: &[u8]) -> Self {
        let mime = mime.into();
        Self {
            name: name.into(),
            payload: format!("data:{};base64,{}", mime, BASE64.encode(bytes)),
            mime,
        }
    }

    /// Ingest a file from disk. Reads the whole file into memory and rejects
    /// anything over [`MAX_ATTACHMENT_BYTES`].
    pub fn from_path(path: &Path) -> Result<Self, AttachmentError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        if bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(AttachmentError::TooLarge {
                name,
                size: bytes.len(),
            });
        }
        let mime = mime_for_extension(path);
        Ok(Self::new(name, mime, &bytes))
    }

    /// Base64 payload with any `data:...;base64,` prefix removed, ready for
    /// the wire.
    pub fn inline_payload(&self) -> &str {
        match self.payload.find("base64,") {
            Some(idx) => &self.payload[idx + "base64,".len()..],
            None => &self.payload,
        }
    }

    /// Decoded payload size in bytes, derived from the base64 text without
    /// decoding it.
    pub fn byte_len(&self) -> usize {
        let encoded = self.inline_payload();
        let padding = encoded.bytes().rev().take_while(|b| *b == b'=').count();
        encoded.len() / 4 * 3 - padding
    }

    pub fn decode_bytes(&self) -> Option<Vec<u8>> {
        BASE64.decode(self.inline_payload()).ok()
    }
}

fn mime_for_extension(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        Some("txt") | Some("md") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// One turn of a conversation. Messages are created once and never mutated;
/// each belongs to exactly one session's transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_trace: Option<String>,
    pub timestamp: i64,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            attachments: Vec::new(),
            reasoning_trace: None,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn user(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            attachments,
            ..Self::new(Role::User, content)
        }
    }

    pub fn assistant(content: impl Into<String>, reasoning_trace: Option<String>) -> Self {
        Self {
            reasoning_trace,
            ..Self::new(Role::Assistant, content)
        }
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_assistant(&self) -> bool {
        self.role.is_assistant()
    }
}
