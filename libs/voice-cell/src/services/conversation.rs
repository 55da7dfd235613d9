// libs/voice-cell/src/services/conversation.rs
//! The booking conversation as a pure state machine.
//!
//! Each turn takes the prior state and the fields extracted from the new
//! utterance, and returns the next state plus the prompt to speak. Nothing
//! is held between calls; the client carries the state blob.

use crate::models::{ConversationStage, ConversationState, ExtractedBooking};

/// One conversation turn.
pub fn advance(state: ConversationState, extracted: &ExtractedBooking) -> (ConversationState, String) {
    if extracted.intent.as_deref() == Some("cancel") {
        return (
            ConversationState::new(),
            "Okay, let's start over. Which provider or specialty would you like to see?".to_string(),
        );
    }

    let mut next = merge_fields(state, extracted);

    if next.stage == ConversationStage::Confirming {
        return confirm_turn(next, extracted);
    }

    // Ask for the first field still missing, in a fixed order.
    if next.provider.is_none() {
        next.stage = ConversationStage::CollectingProvider;
        return (next, "Which provider or specialty would you like to see?".to_string());
    }
    if next.date.is_none() {
        next.stage = ConversationStage::CollectingDate;
        return (next, "What day works for you?".to_string());
    }
    if next.time.is_none() {
        next.stage = ConversationStage::CollectingTime;
        return (next, "What time would you prefer?".to_string());
    }

    next.stage = ConversationStage::Confirming;
    let prompt = format!(
        "You'd like to book with {} on {} at {}. Shall I go ahead?",
        next.provider.as_deref().unwrap_or_default(),
        next.date.as_deref().unwrap_or_default(),
        next.time.as_deref().unwrap_or_default(),
    );
    (next, prompt)
}

/// Fields mentioned in the new utterance overwrite what was collected
/// earlier; silence leaves earlier answers intact.
fn merge_fields(mut state: ConversationState, extracted: &ExtractedBooking) -> ConversationState {
    let spoken_provider = extracted.provider.clone().or_else(|| extracted.specialty.clone());
    if spoken_provider.is_some() {
        state.provider = spoken_provider;
    }
    if extracted.date.is_some() {
        state.date = extracted.date.clone();
    }
    if extracted.time.is_some() {
        state.time = extracted.time.clone();
    }
    state
}

fn confirm_turn(mut state: ConversationState, extracted: &ExtractedBooking) -> (ConversationState, String) {
    match extracted.intent.as_deref() {
        Some("confirm") => {
            state.stage = ConversationStage::Complete;
            (state, "Great, booking your appointment now.".to_string())
        }
        _ => {
            let prompt = format!(
                "Just to confirm: {} on {} at {}. Please say yes to book or no to start over.",
                state.provider.as_deref().unwrap_or_default(),
                state.date.as_deref().unwrap_or_default(),
                state.time.as_deref().unwrap_or_default(),
            );
            (state, prompt)
        }
    }
}
