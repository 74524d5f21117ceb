//! Conversation state types

use super::script::{AnswerRecord, AnswerSlot, SCRIPT_LEN};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which half of the conversation we are in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Walking through the scripted prompts
    #[default]
    Scripted,
    /// Script exhausted, messages go to the responder
    Freeform,
}

/// Progress through one conversation session.
///
/// `phase` is `Freeform` exactly when `index == SCRIPT_LEN`. Within a
/// session `index` only grows and the phase only moves forward.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversationState {
    index: usize,
    phase: Phase,
    answers: AnswerRecord,
}

impl ConversationState {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn answers(&self) -> &AnswerRecord {
        &self.answers
    }

    /// Slot the next scripted answer will fill
    pub fn current_slot(&self) -> Option<AnswerSlot> {
        match self.phase {
            Phase::Scripted => AnswerSlot::at(self.index),
            Phase::Freeform => None,
        }
    }

    /// Record the answer for the current prompt and move past it
    pub(super) fn record_answer(&self, answer: String) -> Self {
        let mut next = self.clone();
        if let Some(slot) = self.current_slot() {
            next.answers.set(slot, answer);
            next.index += 1;
            if next.index == SCRIPT_LEN {
                next.phase = Phase::Freeform;
            }
        }
        next
    }
}

/// Immutable timing configuration for a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationContext {
    /// Pause before a scripted question or responder reply is shown
    pub reply_latency: Duration,
    /// Pause before the opening greeting
    pub greeting_latency: Duration,
}

impl ConversationContext {
    pub fn new(reply_latency: Duration, greeting_latency: Duration) -> Self {
        Self {
            reply_latency,
            greeting_latency,
        }
    }

    /// No artificial pauses; used by tests and scripted runs
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Duration::from_millis(500))
    }
}
