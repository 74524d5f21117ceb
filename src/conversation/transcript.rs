//! Ordered message log shared by the controller and the presenter

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One entry in the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Speaker,
    pub created_at: DateTime<Utc>,
    /// Set while a typewriter reveal is still growing `text`
    pub revealing: bool,
}

/// Change notifications for transcript observers
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEvent {
    Appended(Message),
    Updated {
        id: String,
        text: String,
        revealing: bool,
    },
    Cleared,
}

/// Append-only log of messages.
///
/// Cheap to clone; all clones share the same log. Messages are never
/// reordered or removed except by `clear`, which only a new conversation
/// issues.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Arc<Mutex<Vec<Message>>>,
    events: broadcast::Sender<TranscriptEvent>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
            events,
        }
    }

    /// Append a message and return its id
    pub fn push(&self, sender: Speaker, text: impl Into<String>, revealing: bool) -> String {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            created_at: Utc::now(),
            revealing,
        };
        let id = message.id.clone();
        self.messages.lock().unwrap().push(message.clone());
        let _ = self.events.send(TranscriptEvent::Appended(message));
        id
    }

    /// Replace the text of a message being revealed.
    ///
    /// Returns false if the message is gone (transcript cleared) or its
    /// reveal already finished.
    pub fn update(&self, id: &str, text: &str, revealing: bool) -> bool {
        {
            let mut messages = self.messages.lock().unwrap();
            let Some(message) = messages.iter_mut().find(|m| m.id == id) else {
                return false;
            };
            if !message.revealing {
                return false;
            }
            message.text = text.to_string();
            message.revealing = revealing;
        }
        let _ = self.events.send(TranscriptEvent::Updated {
            id: id.to_string(),
            text: text.to_string(),
            revealing,
        });
        true
    }

    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
        let _ = self.events.send(TranscriptEvent::Cleared);
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while any message is still being revealed
    pub fn is_revealing(&self) -> bool {
        self.messages.lock().unwrap().iter().any(|m| m.revealing)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.events.subscribe()
    }
}
