//! JSON messages exchanged with clients.

use crate::defaults;
use crate::error::{Result, SignStreamError};
use serde::{Deserialize, Serialize};

/// Messages sent to a streaming client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    /// Live echo of a sign recognised in the latest frame.
    Intermediate { current_sign: String, confidence: f32 },
    /// A completed sentence and its synthesized audio.
    Final {
        final_sentence: String,
        audio_path: Option<String>,
    },
}

impl OutboundMessage {
    /// Serialize message to JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize message from JSON string.
    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Text-to-sign request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

impl TextRequest {
    /// Reject blank or oversized text before it reaches any collaborator.
    ///
    /// Whitespace-only text counts as blank: there is nothing to refine or
    /// look up, so it is rejected like an empty string.
    pub fn validate(&self) -> Result<()> {
        let chars = self.text.chars().count();
        if self.text.trim().is_empty() {
            return Err(SignStreamError::InvalidRequest {
                message: "text must not be blank".to_string(),
            });
        }
        if chars > defaults::MAX_TEXT_CHARS {
            return Err(SignStreamError::InvalidRequest {
                message: format!(
                    "text must be at most {} characters, got {chars}",
                    defaults::MAX_TEXT_CHARS
                ),
            });
        }
        Ok(())
    }
}

/// Text-to-sign response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextResponse {
    pub input_text: String,
    pub interpreted_text: String,
    pub sign_asset: String,
    pub audio_path: Option<String>,
}

/// Health check body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn online() -> Self {
        Self {
            status: "online".to_string(),
            message: "Real-time Sign Translator Ready".to_string(),
        }
    }
}

/// Client-facing error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
