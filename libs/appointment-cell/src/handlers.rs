// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AvailabilityQuery, BookAppointmentRequest, BookingError, UpdateStatusRequest};
use crate::services::booking::BookingService;
use crate::services::conflict::ConflictDetectionService;

fn map_booking_error(e: BookingError) -> AppError {
    match e {
        BookingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        BookingError::ProviderNotFound { query } => {
            AppError::NotFound(format!("No provider matched \"{}\"", query))
        }
        BookingError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
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

/// Day view: every candidate slot for a provider and date, with the taken
/// ones marked and an explicit reason when nothing is open.
#[axum::debug_handler]
pub async fn get_day_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let schedule = ConflictDetectionService::new(&state)
        .day_schedule(query.provider_id, query.date, auth.token())
        .await
        .map_err(map_booking_error)?;

    let mut body = json!({
        "provider_id": query.provider_id,
        "date": query.date,
        "available": schedule.available,
        "slots": schedule.slots,
    });
    if let Some(reason) = schedule.reason {
        body["reason"] = json!(reason);
    }

    Ok(Json(body))
}

/// Commit a reservation. A lost race surfaces as a 409 carrying the
/// remaining open slots so the caller can re-offer them.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, Response> {
    let result = BookingService::new(&state)
        .book_appointment(request, auth.token())
        .await;

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
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = BookingService::new(&state)
        .get_appointment(appointment_id, auth.token())
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = BookingService::new(&state)
        .update_status(appointment_id, request, &user.id, user.is_admin(), auth.token())
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn list_patient_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointments = BookingService::new(&state)
        .list_for_patient(patient_id, auth.token())
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}

#[derive(Debug, Deserialize)]
pub struct ProviderAppointmentsQuery {
    pub date: Option<NaiveDate>,
}

#[axum::debug_handler]
pub async fn list_provider_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<ProviderAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = BookingService::new(&state)
        .list_for_provider(provider_id, query.date, auth.token())
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}
