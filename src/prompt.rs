//! Prompt construction for the chat proxy

use crate::conversation::{AnswerRecord, AnswerSlot};
use crate::llm::LlmRequest;

/// Reply length cap sent to the provider
pub const MAX_OUTPUT_TOKENS: u32 = 200;

/// Sampling temperature sent to the provider
pub const TEMPERATURE: f32 = 0.7;

const BASE_PROMPT: &str = "You are an AI assistant helping a student prepare for their Stanford University application. The conversation topic is about their short-term and long-term goals, and why they want to attend Stanford.

Be encouraging, thoughtful, and ask follow-up questions that help the student think deeper about their aspirations. Keep responses conversational and around 2-3 sentences.";

const NOT_PROVIDED: &str = "Not provided";

/// Build the full prompt for one student message.
///
/// The answer block is only included when the caller asked for a
/// personalized reply and supplied context.
pub fn build_prompt(message: &str, context: Option<&AnswerRecord>, personalized: bool) -> String {
    let mut prompt = BASE_PROMPT.to_string();

    if let (true, Some(answers)) = (personalized, context) {
        prompt.push_str("\n\nHere's what you know about the student from previous questions:");
        for slot in AnswerSlot::ALL {
            let answer = answers
                .get(slot)
                .filter(|a| !a.is_empty())
                .unwrap_or(NOT_PROVIDED);
            prompt.push_str(&format!("\n- {}: {answer}", slot.label()));
        }
        prompt.push_str(
            "\n\nUse this context to provide personalized advice and make specific connections between their background and Stanford's offerings.",
        );
    }

    prompt.push_str("\n\nStudent message: ");
    prompt.push_str(message);
    prompt
}

/// Build the provider request for one student message
pub fn build_request(message: &str, context: Option<&AnswerRecord>, personalized: bool) -> LlmRequest {
    LlmRequest::new(build_prompt(message, context, personalized))
        .with_max_output_tokens(MAX_OUTPUT_TOKENS)
        .with_temperature(TEMPERATURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_prompt_has_no_context_block() {
        let prompt = build_prompt("What should I write?", None, true);
        assert!(prompt.starts_with("You are an AI assistant"));
        assert!(!prompt.contains("previous questions"));
        assert!(prompt.ends_with("Student message: What should I write?"));

        let mut answers = AnswerRecord::default();
        answers.set(AnswerSlot::CurrentStudy, "Biology".to_string());
        let unpersonalized = build_prompt("Hi", Some(&answers), false);
        assert!(!unpersonalized.contains("Biology"));
    }

    #[test]
    fn test_personalized_prompt_lists_answers() {
        let mut answers = AnswerRecord::default();
        answers.set(AnswerSlot::CurrentStudy, "Computer science".to_string());
        answers.set(AnswerSlot::Impact, "Clean water".to_string());

        let prompt = build_prompt("Help me", Some(&answers), true);
        assert!(prompt.contains("- Current study/interest: Computer science"));
        assert!(prompt.contains("- Experiences/projects: Not provided"));
        assert!(prompt.contains("- Stanford program interest: Not provided"));
        assert!(prompt.contains("- Community preferences: Not provided"));
        assert!(prompt.contains("- Impact goals: Clean water"));
        assert!(prompt.ends_with("Student message: Help me"));
    }

    #[test]
    fn test_request_settings() {
        let request = build_request("Hi", None, false);
        assert_eq!(request.max_output_tokens, Some(200));
        assert_eq!(request.temperature, Some(TEMPERATURE));
    }
}
