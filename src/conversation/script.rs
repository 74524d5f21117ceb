//! The fixed onboarding script and the answers collected against it

use serde::{Deserialize, Serialize};

/// Number of scripted prompts
pub const SCRIPT_LEN: usize = 5;

/// Onboarding questions, asked in order before free-form chat
pub const SCRIPTED_PROMPTS: [&str; SCRIPT_LEN] = [
    "To get started, could you share a bit about what you're currently studying or your main area of interest? This helps me understand your starting point.",
    "Thinking about your short-term goals, are there any specific projects, experiences, or internships you've already been involved in that have shaped these ambitions?",
    "When you think about Stanford, is there a particular program, a professor's work, or a research center that really stands out to you and directly aligns with your long-term goals?",
    "What kind of community do you hope to find at Stanford? Are there specific student organizations, collaborative environments, or extracurriculars that you're excited to join that would support your journey?",
    "Let's talk impact. What's the biggest problem you want to solve in your chosen field, and how do you believe a Stanford education will uniquely equip you to tackle it?",
];

/// Prefixed to the first question when a conversation starts
pub const GREETING: &str = "Hi! I'm excited to help you craft a compelling Stanford application. I'll start by asking you a few questions to understand your background and goals better.";

/// Sent once the last scripted answer is in
pub const HANDOFF_MESSAGE: &str = "Thank you for sharing those insights! Now I have a much better understanding of your background and goals. Let's dive deeper into crafting your Stanford application narrative. What specific aspect would you like to explore further - perhaps how to connect your experiences to Stanford's resources, or how to articulate your unique value proposition?";

/// Sent in place of a reply when the responder fails
pub const FALLBACK_MESSAGE: &str =
    "Sorry, I'm having trouble responding right now. Please try again.";

/// Opening message: greeting followed by the first question
pub fn opening_message() -> String {
    format!("{GREETING} {}", SCRIPTED_PROMPTS[0])
}

/// Named answer slot, one per scripted prompt position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerSlot {
    CurrentStudy,
    Experiences,
    StanfordProgram,
    Community,
    Impact,
}

impl AnswerSlot {
    /// Slots in script order
    pub const ALL: [AnswerSlot; SCRIPT_LEN] = [
        AnswerSlot::CurrentStudy,
        AnswerSlot::Experiences,
        AnswerSlot::StanfordProgram,
        AnswerSlot::Community,
        AnswerSlot::Impact,
    ];

    /// Slot for a script position, if in range
    pub fn at(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Human label used when presenting the answer as context
    pub fn label(self) -> &'static str {
        match self {
            AnswerSlot::CurrentStudy => "Current study/interest",
            AnswerSlot::Experiences => "Experiences/projects",
            AnswerSlot::StanfordProgram => "Stanford program interest",
            AnswerSlot::Community => "Community preferences",
            AnswerSlot::Impact => "Impact goals",
        }
    }
}

/// Answers to the scripted prompts. Serialized with the camelCase keys the
/// chat endpoint expects; unanswered slots are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_study: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiences: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stanford_program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
}

impl AnswerRecord {
    fn slot_mut(&mut self, slot: AnswerSlot) -> &mut Option<String> {
        match slot {
            AnswerSlot::CurrentStudy => &mut self.current_study,
            AnswerSlot::Experiences => &mut self.experiences,
            AnswerSlot::StanfordProgram => &mut self.stanford_program,
            AnswerSlot::Community => &mut self.community,
            AnswerSlot::Impact => &mut self.impact,
        }
    }

    pub fn get(&self, slot: AnswerSlot) -> Option<&str> {
        match slot {
            AnswerSlot::CurrentStudy => self.current_study.as_deref(),
            AnswerSlot::Experiences => self.experiences.as_deref(),
            AnswerSlot::StanfordProgram => self.stanford_program.as_deref(),
            AnswerSlot::Community => self.community.as_deref(),
            AnswerSlot::Impact => self.impact.as_deref(),
        }
    }

    pub fn set(&mut self, slot: AnswerSlot, answer: String) {
        *self.slot_mut(slot) = Some(answer);
    }

    /// Number of populated slots
    pub fn filled(&self) -> usize {
        AnswerSlot::ALL
            .iter()
            .filter(|slot| self.get(**slot).is_some())
            .count()
    }
}
