// libs/voice-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// EXTRACTION MODELS
// ==============================================================================

/// Best-effort structured guess produced by the extraction service. Every
/// field is optional: the model output is untrusted and partially populated,
/// so callers must check presence rather than assume it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractedBooking {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    /// `YYYY-MM-DD` when present.
    #[serde(default)]
    pub date: Option<String>,
    /// `HH:MM`, 24-hour, when present.
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

// ==============================================================================
// CONVERSATION MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    CollectingProvider,
    CollectingDate,
    CollectingTime,
    Confirming,
    Complete,
}

/// The whole conversation, as a value. The client holds this blob and sends
/// it back with each utterance; the server keeps nothing between turns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationState {
    pub stage: ConversationStage,
    pub provider: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            stage: ConversationStage::CollectingProvider,
            provider: None,
            date: None,
            time: None,
        }
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpretRequest {
    pub transcript: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConverseRequest {
    /// Omitted on the first turn; the server starts a fresh state.
    #[serde(default)]
    pub state: Option<ConversationState>,
    pub utterance: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceBookRequest {
    pub transcript: String,
    pub patient_id: Uuid,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("Upstream service error: {0}")]
    UpstreamServiceError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No provider matched \"{query}\"")]
    ProviderNotFound { query: String },
}
