// libs/voice-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{NaiveDate, Utc};
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::info;

use shared_config::AppConfig;
use shared_models::error::AppError;

use appointment_cell::models::{BookAppointmentRequest, BookingChannel, BookingError};
use appointment_cell::services::booking::BookingService;

use provider_cell::services::resolver::ProviderResolver;
use provider_cell::ProviderError;

use crate::models::{ConversationState, ConverseRequest, InterpretRequest, VoiceBookRequest, VoiceError};
use crate::services::conversation;
use crate::services::extraction::ExtractionService;
use crate::services::transcription::TranscriptionService;

fn map_voice_error(e: VoiceError) -> AppError {
    match e {
        VoiceError::UpstreamServiceError(msg) => AppError::ExternalService(msg),
        VoiceError::ValidationError(msg) => AppError::ValidationError(msg),
        VoiceError::ProviderNotFound { query } => {
            AppError::NotFound(format!("No provider matched \"{}\"", query))
        }
    }
}

fn map_booking_error(e: BookingError) -> AppError {
    match e {
        BookingError::ProviderNotFound { query } => {
            AppError::NotFound(format!("No provider matched \"{}\"", query))
        }
        BookingError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        BookingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        BookingError::SlotConflict { .. } => {
            AppError::Conflict("Requested slot is already booked".to_string())
        }
        BookingError::DayInactive => AppError::ValidationError(
            "Provider has no availability on the requested day".to_string(),
        ),
        BookingError::TimeOutOfBounds => AppError::ValidationError(
            "Requested time is outside the provider's bookable slots".to_string(),
        ),
        BookingError::ValidationError(msg) => AppError::ValidationError(msg),
        BookingError::InvalidStatusTransition { from, to } => {
            AppError::ValidationError(format!("Appointment cannot move from {} to {}", from, to))
        }
        BookingError::Unauthorized => {
            AppError::Auth("Not authorized to access this appointment".to_string())
        }
        BookingError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Raw audio in, transcript out.
#[axum::debug_handler]
pub async fn transcribe(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(_auth): TypedHeader<Authorization<Bearer>>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let transcript = TranscriptionService::new(&state)
        .transcribe(body.to_vec(), "recording.webm")
        .await
        .map_err(map_voice_error)?;

    Ok(Json(json!({ "transcript": transcript })))
}

/// One-shot extraction of booking fields from a transcript.
#[axum::debug_handler]
pub async fn interpret(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(_auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<InterpretRequest>,
) -> Result<Json<Value>, AppError> {
    let today = Utc::now().date_naive();
    let extracted = ExtractionService::new(&state)
        .extract(&request.transcript, today)
        .await
        .map_err(map_voice_error)?;

    Ok(Json(json!({ "extracted": extracted })))
}

/// One conversation turn: extract fields from the utterance, then advance
/// the state machine. The returned state goes back to the client, which
/// sends it in again with the next utterance.
#[axum::debug_handler]
pub async fn converse(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(_auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<ConverseRequest>,
) -> Result<Json<Value>, AppError> {
    let today = Utc::now().date_naive();
    let extracted = ExtractionService::new(&state)
        .extract(&request.utterance, today)
        .await
        .map_err(map_voice_error)?;

    let conversation_state = request.state.unwrap_or_else(ConversationState::new);
    let (next_state, prompt) = conversation::advance(conversation_state, &extracted);

    Ok(Json(json!({
        "state": next_state,
        "prompt": prompt,
    })))
}

/// End-to-end voice booking: transcript in, committed appointment out.
/// Failures map to the same typed responses as the manual booking route,
/// so the caller can always offer a specific next action.
#[axum::debug_handler]
pub async fn book(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<VoiceBookRequest>,
) -> Result<Json<Value>, Response> {
    let token = auth.token();
    let today = Utc::now().date_naive();

    let extracted = ExtractionService::new(&state)
        .extract(&request.transcript, today)
        .await
        .map_err(|e| map_voice_error(e).into_response())?;

    let resolved = ProviderResolver::new(&state)
        .resolve_fields(extracted.provider.as_deref(), extracted.specialty.as_deref(), token)
        .await
        .map_err(|e| {
            let query = match e {
                ProviderError::NotFound { query } => query,
                other => return map_booking_error(BookingError::DatabaseError(other.to_string()))
                    .into_response(),
            };
            map_voice_error(VoiceError::ProviderNotFound { query }).into_response()
        })?;

    let date = extracted
        .date
        .as_deref()
        .and_then(|d| d.parse::<NaiveDate>().ok())
        .ok_or_else(|| {
            map_voice_error(VoiceError::ValidationError(
                "Could not determine the appointment date from the request".to_string(),
            ))
            .into_response()
        })?;

    let time = extracted.time.clone().ok_or_else(|| {
        map_voice_error(VoiceError::ValidationError(
            "Could not determine the appointment time from the request".to_string(),
        ))
        .into_response()
    })?;

    info!(
        "Voice booking: resolved provider {} (confidence {:.2})",
        resolved.provider.id, resolved.confidence
    );

    let booking = BookAppointmentRequest {
        provider_id: resolved.provider.id,
        patient_id: request.patient_id,
        date,
        time,
        reason: Some(request.transcript.clone()),
        channel: BookingChannel::Voice,
    };

    let result = BookingService::new(&state).book_appointment(booking, token).await;

    let confirmation = match result {
        Ok(confirmation) => confirmation,
        Err(BookingError::SlotConflict { alternatives }) => {
            let body = Json(json!({
                "error": "Requested slot is already booked",
                "alternatives": alternatives,
            }));
            return Err((StatusCode::CONFLICT, body).into_response());
        }
        Err(e) => return Err(map_booking_error(e).into_response()),
    };

    Ok(Json(json!({
        "success": true,
        "appointment": confirmation.appointment,
        "provider_name": confirmation.provider_name,
        "specialty": confirmation.specialty,
        "confidence": resolved.confidence,
    })))
}
