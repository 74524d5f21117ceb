//! Scripted onboarding conversation
//!
//! The conversation walks through a fixed list of prompts, recording one
//! answer per prompt, then hands every further message to a [`Responder`]
//! together with the collected answers.
//!
//! Decisions are made by the pure [`transition`] function; the
//! [`ConversationController`] executes the resulting effects.

mod controller;
mod effect;
mod event;
mod responder;
mod script;
mod state;
mod transcript;
mod transition;
mod typewriter;

#[cfg(test)]
mod proptests;

pub use controller::ConversationController;
pub use effect::Effect;
pub use event::Event;
pub use responder::{HttpResponder, Responder, ResponderError};
pub use script::{
    opening_message, AnswerRecord, AnswerSlot, FALLBACK_MESSAGE, GREETING, HANDOFF_MESSAGE,
    SCRIPTED_PROMPTS, SCRIPT_LEN,
};
pub use state::{ConversationContext, ConversationState, Phase};
pub use transcript::{Message, Speaker, Transcript, TranscriptEvent};
pub use transition::{transition, TransitionResult};
pub use typewriter::{Presenter, RevealSteps, Typewriter};
