//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! next state and effects. Timers, the transcript and the responder are
//! handled by the controller that executes the effects.

use super::script::{opening_message, FALLBACK_MESSAGE, HANDOFF_MESSAGE, SCRIPTED_PROMPTS};
use super::{ConversationContext, ConversationState, Effect, Event, Phase};

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConversationState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConversationState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

pub fn transition(
    state: &ConversationState,
    context: &ConversationContext,
    event: Event,
) -> TransitionResult {
    match event {
        Event::Start => TransitionResult::new(ConversationState::default())
            .with_effect(Effect::ClearTranscript)
            .with_effect(Effect::reveal_after(
                context.greeting_latency,
                opening_message(),
            )),

        // Blank input is ignored entirely
        Event::UserMessage { text } if text.trim().is_empty() => {
            TransitionResult::new(state.clone())
        }

        Event::UserMessage { text } => match state.phase() {
            Phase::Scripted => {
                let next = state.record_answer(text.clone());
                let follow_up = match next.phase() {
                    Phase::Scripted => SCRIPTED_PROMPTS[next.index()],
                    Phase::Freeform => HANDOFF_MESSAGE,
                };
                TransitionResult::new(next)
                    .with_effect(Effect::AppendUserMessage { text })
                    .with_effect(Effect::reveal_after(context.reply_latency, follow_up))
            }
            Phase::Freeform => TransitionResult::new(state.clone())
                .with_effect(Effect::AppendUserMessage { text: text.clone() })
                .with_effect(Effect::Delegate {
                    message: text,
                    context: state.answers().clone(),
                }),
        },

        Event::ResponderReply { text } => TransitionResult::new(state.clone())
            .with_effect(Effect::reveal_after(context.reply_latency, text)),

        // Failures never escape; the user just sees an apology
        Event::ResponderFailed { .. } => TransitionResult::new(state.clone())
            .with_effect(Effect::reveal_after(
                std::time::Duration::ZERO,
                FALLBACK_MESSAGE,
            )),
    }
}
