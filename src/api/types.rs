//! API request and response types

use crate::conversation::AnswerRecord;
use crate::db::ContactEntry;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<AnswerRecord>,
    #[serde(default)]
    pub is_personalized: bool,
}

/// Response to a successful contact form submission
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub entry: ContactEntry,
}

/// All contact entries, newest first
#[derive(Debug, Serialize, Deserialize)]
pub struct EntriesResponse {
    pub entries: Vec<ContactEntry>,
}

/// Details of an uploaded audio file
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioUploadResponse {
    pub success: bool,
    pub message: String,
    pub file_size: usize,
    pub file_name: Option<String>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
