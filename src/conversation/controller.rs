//! Conversation controller: executes the effects of pure transitions

use super::responder::Responder;
use super::transcript::{Speaker, Transcript};
use super::transition::transition;
use super::typewriter::Presenter;
use super::{ConversationContext, ConversationState, Effect, Event};
use std::collections::VecDeque;

/// Drives one conversation session.
///
/// `submit` takes `&mut self`, so a second message cannot be processed until
/// the previous one (including any responder call) has finished.
pub struct ConversationController<R, P> {
    context: ConversationContext,
    state: ConversationState,
    responder: R,
    presenter: P,
    transcript: Transcript,
}

impl<R: Responder, P: Presenter> ConversationController<R, P> {
    pub fn new(
        context: ConversationContext,
        responder: R,
        presenter: P,
        transcript: Transcript,
    ) -> Self {
        Self {
            context,
            state: ConversationState::default(),
            responder,
            presenter,
            transcript,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Reset to a fresh session and greet the user
    pub async fn start(&mut self) {
        self.handle(Event::Start).await;
    }

    /// Process one user message. Blank input is ignored.
    pub async fn submit(&mut self, text: &str) {
        self.handle(Event::UserMessage {
            text: text.to_string(),
        })
        .await;
    }

    async fn handle(&mut self, event: Event) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            let result = transition(&self.state, &self.context, event);
            self.state = result.new_state;
            for effect in result.effects {
                if let Some(next) = self.execute_effect(effect).await {
                    pending.push_back(next);
                }
            }
        }
    }

    async fn execute_effect(&self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::ClearTranscript => {
                self.transcript.clear();
                None
            }
            Effect::AppendUserMessage { text } => {
                self.transcript.push(Speaker::User, text, false);
                None
            }
            Effect::Reveal { delay, text } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                self.presenter.reveal(text);
                None
            }
            Effect::Delegate { message, context } => {
                match self.responder.respond(&message, &context).await {
                    Ok(text) => Some(Event::ResponderReply { text }),
                    Err(error) => {
                        tracing::warn!(error = %error, "Responder failed, sending fallback");
                        Some(Event::ResponderFailed { error })
                    }
                }
            }
        }
    }
}
