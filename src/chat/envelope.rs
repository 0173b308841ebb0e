//! Wire format spoken with the webhook.
//!
//! Requests are a JSON envelope carrying the message text, the thread id, the
//! send timestamp and every attachment inline as base64. By default the
//! envelope is wrapped in a one-element array, which is what batch-style
//! webhook ingestion expects.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::Value;

use super::error::ChatError;
use super::message::AttachmentFile;

/// Assistant text used when the webhook reply carries none
pub const NO_RESPONSE: &str = "No response from AI";

/// How the envelope is laid out in the request body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeShape {
    /// `[ { ...envelope } ]`
    #[default]
    Batch,
    /// `{ ...envelope }`
    Object,
}

impl FromStr for EnvelopeShape {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batch" | "array" => Ok(Self::Batch),
            "object" => Ok(Self::Object),
            other => anyhow::bail!("unknown envelope shape '{}', expected 'batch' or 'object'", other),
        }
    }
}

impl fmt::Display for EnvelopeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Batch => write!(f, "batch"),
            Self::Object => write!(f, "object"),
        }
    }
}

/// An attachment as it travels over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireAttachment {
    #[serde(rename = "attachmentName")]
    pub name: String,
    #[serde(rename = "attachmentMime")]
    pub mime: String,
    /// Standard base64, without a data-URL prefix
    #[serde(rename = "attachmentData")]
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub message: String,
    pub thread_id: String,
    pub timestamp: i64,
    pub attachment_count: usize,
    pub attachments: Vec<WireAttachment>,
}

impl Envelope {
    pub fn new(
        message: String,
        thread_id: String,
        timestamp: i64,
        attachments: Vec<WireAttachment>,
    ) -> Self {
        Self {
            message,
            thread_id,
            timestamp,
            attachment_count: attachments.len(),
            attachments,
        }
    }

    /// Serialize into the request body
    pub fn to_body(&self, shape: EnvelopeShape) -> Result<String, ChatError> {
        let encoded = match shape {
            EnvelopeShape::Batch => serde_json::to_string(&[self]),
            EnvelopeShape::Object => serde_json::to_string(self),
        };
        encoded.map_err(|e| ChatError::Encode(e.to_string()))
    }
}

/// Read and base64-encode every attachment, in order. The first unreadable
/// file aborts the whole batch.
pub async fn encode_attachments(files: &[AttachmentFile]) -> Result<Vec<WireAttachment>, ChatError> {
    let mut encoded = Vec::with_capacity(files.len());

    for file in files {
        let bytes = file.read().await.map_err(|source| ChatError::Attachment {
            name: file.name.clone(),
            source,
        })?;

        encoded.push(WireAttachment {
            name: file.name.clone(),
            mime: file.mime.clone(),
            data: STANDARD.encode(bytes),
        });
    }

    Ok(encoded)
}

/// The useful parts of a webhook reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookReply {
    pub thread_id: Option<String>,
    pub response: Option<String>,
}

impl WebhookReply {
    /// Parse a reply body. Missing, empty or non-string fields are treated as
    /// absent. An array body is read through its first element.
    pub fn parse(body: &str) -> Result<Self, ChatError> {
        let value: Value = serde_json::from_str(body)?;
        let object = match &value {
            Value::Array(items) => items.first(),
            other => Some(other),
        };

        let field = |key: &str| {
            object
                .and_then(|o| o.get(key))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            thread_id: field("threadId"),
            response: field("response"),
        })
    }

    pub fn response_text(&self) -> &str {
        self.response.as_deref().unwrap_or(NO_RESPONSE)
    }
}
