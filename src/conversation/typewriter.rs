//! Typewriter presentation of assistant messages
//!
//! A reveal appends an empty assistant message with the reveal flag set,
//! then grows it by one character per tick. The flag is cleared on the tick
//! that shows the full text.

use super::transcript::{Speaker, Transcript};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::{interval_at, Instant};

/// Successive prefixes of a text, one character longer each step.
///
/// Yields `(prefix, done)`; `done` is true only for the full text. An empty
/// text yields a single `("", true)` step so the reveal still finishes.
#[derive(Debug, Clone)]
pub struct RevealSteps {
    pending: VecDeque<char>,
    shown: String,
    finished: bool,
}

impl RevealSteps {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            pending: text.into().chars().collect(),
            shown: String::new(),
            finished: false,
        }
    }
}

impl Iterator for RevealSteps {
    type Item = (String, bool);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(c) = self.pending.pop_front() {
            self.shown.push(c);
        }
        self.finished = self.pending.is_empty();
        Some((self.shown.clone(), self.finished))
    }
}

/// Something that can put an assistant message in front of the user
pub trait Presenter: Send + Sync {
    /// Start presenting `text` as a new assistant message and return its id.
    /// Returns immediately; the reveal may finish later.
    fn reveal(&self, text: String) -> String;
}

/// Reveals messages into a [`Transcript`] at a fixed cadence
#[derive(Debug, Clone)]
pub struct Typewriter {
    transcript: Transcript,
    tick: Duration,
}

impl Typewriter {
    pub fn new(transcript: Transcript, tick: Duration) -> Self {
        Self { transcript, tick }
    }
}

impl Presenter for Typewriter {
    /// With a non-zero tick this spawns the ticking task, so it must be
    /// called from within a tokio runtime.
    fn reveal(&self, text: String) -> String {
        let id = self.transcript.push(Speaker::Assistant, "", true);

        if self.tick.is_zero() {
            self.transcript.update(&id, &text, false);
            return id;
        }

        let transcript = self.transcript.clone();
        let tick = self.tick;
        let message_id = id.clone();
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + tick, tick);
            for (prefix, done) in RevealSteps::new(text) {
                ticker.tick().await;
                if !transcript.update(&message_id, &prefix, !done) {
                    tracing::debug!(id = %message_id, "Reveal target gone, stopping");
                    break;
                }
            }
        });

        id
    }
}

impl<T: Presenter + ?Sized> Presenter for std::sync::Arc<T> {
    fn reveal(&self, text: String) -> String {
        (**self).reveal(text)
    }
}
