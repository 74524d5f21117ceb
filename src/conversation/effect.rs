//! Effects produced by state transitions

use super::script::AnswerRecord;
use std::time::Duration;

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Drop every message from the transcript
    ClearTranscript,

    /// Append the user's message to the transcript
    AppendUserMessage { text: String },

    /// Wait, then reveal an assistant message
    Reveal { delay: Duration, text: String },

    /// Ask the responder for a reply
    Delegate {
        message: String,
        context: AnswerRecord,
    },
}

impl Effect {
    pub fn reveal_after(delay: Duration, text: impl Into<String>) -> Self {
        Effect::Reveal {
            delay,
            text: text.into(),
        }
    }
}
