//! Events that drive the conversation

use super::responder::ResponderError;

/// Inputs to the conversation state machine
#[derive(Debug, Clone)]
pub enum Event {
    /// Start (or restart) a conversation
    Start,
    /// Text typed by the user
    UserMessage { text: String },
    /// The responder produced a reply
    ResponderReply { text: String },
    /// The responder call failed
    ResponderFailed { error: ResponderError },
}
