//! Socket message envelope shared by the relay client and the server
//!
//! Every frame is a JSON object `{"event": "...", "data": {...}}`.

use super::clip::AudioClip;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confirmation text the server puts in every receipt
pub const RECEIPT_MESSAGE: &str = "Audio data received successfully";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum SocketMessage {
    /// Client to server: one clip
    AudioData(AudioPayload),
    /// Server to client: receipt for a clip
    AudioReceived(AudioReceipt),
}

/// A clip as sent over the socket; audio is a plain array of byte values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioPayload {
    pub audio: Vec<u8>,
    pub timestamp: DateTime<Utc>,
    pub size: usize,
    #[serde(rename = "type")]
    pub content_type: String,
}

impl From<&AudioClip> for AudioPayload {
    fn from(clip: &AudioClip) -> Self {
        Self {
            audio: clip.bytes.clone(),
            timestamp: clip.captured_at,
            size: clip.size,
            content_type: clip.content_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioReceipt {
    pub audio: Vec<u8>,
    pub message: String,
    /// Server time of receipt
    pub timestamp: DateTime<Utc>,
    pub size: usize,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl AudioReceipt {
    /// Echo a payload back with the confirmation message
    pub fn for_payload(payload: AudioPayload, received_at: DateTime<Utc>) -> Self {
        Self {
            audio: payload.audio,
            message: RECEIPT_MESSAGE.to_string(),
            timestamp: received_at,
            size: payload.size,
            content_type: Some(payload.content_type),
        }
    }
}
