//! Property-based tests for the conversation state machine

use super::script::SCRIPT_LEN;
use super::transition::transition;
use super::*;
use proptest::prelude::*;

fn arb_message() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-zA-Z][a-zA-Z ]{0,30}",
        1 => "[ \t\n]{0,4}",
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        6 => arb_message().prop_map(|text| Event::UserMessage { text }),
        1 => "[a-z ]{1,20}".prop_map(|text| Event::ResponderReply { text }),
        1 => "[a-z]{1,10}".prop_map(|e| Event::ResponderFailed {
            error: ResponderError::Network(e)
        }),
    ]
}

proptest! {
    #[test]
    fn index_never_decreases(events in prop::collection::vec(arb_event(), 0..30)) {
        let context = ConversationContext::immediate();
        let mut state = ConversationState::default();
        for event in events {
            let next = transition(&state, &context, event).new_state;
            prop_assert!(next.index() >= state.index());
            prop_assert!(next.index() <= SCRIPT_LEN);
            if state.phase() == Phase::Freeform {
                prop_assert_eq!(next.phase(), Phase::Freeform);
            }
            state = next;
        }
    }

    #[test]
    fn phase_matches_index(events in prop::collection::vec(arb_event(), 0..30)) {
        let context = ConversationContext::immediate();
        let mut state = ConversationState::default();
        for event in events {
            state = transition(&state, &context, event).new_state;
            prop_assert_eq!(state.phase() == Phase::Freeform, state.index() == SCRIPT_LEN);
        }
    }

    #[test]
    fn one_slot_per_accepted_answer(messages in prop::collection::vec(arb_message(), 0..12)) {
        let context = ConversationContext::immediate();
        let mut state = ConversationState::default();
        let mut accepted = 0;
        for text in messages {
            if !text.trim().is_empty() {
                accepted += 1;
            }
            state = transition(&state, &context, Event::UserMessage { text }).new_state;
        }
        prop_assert_eq!(state.answers().filled(), accepted.min(SCRIPT_LEN));
        prop_assert_eq!(state.index(), accepted.min(SCRIPT_LEN));
    }

    #[test]
    fn blank_input_has_no_effects(blank in "[ \t\n]{0,8}", answered in 0usize..=SCRIPT_LEN) {
        let context = ConversationContext::immediate();
        let state = (0..answered).fold(ConversationState::default(), |s, i| {
            transition(&s, &context, Event::UserMessage { text: format!("a{i}") }).new_state
        });
        let result = transition(&state, &context, Event::UserMessage { text: blank });
        prop_assert_eq!(result.new_state, state);
        prop_assert!(result.effects.is_empty());
    }
}
