// libs/appointment-cell/src/services/booking.rs
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{is_conflict_error, SupabaseClient};

use provider_cell::services::provider::ProviderService;
use provider_cell::{Provider, ProviderError};

use crate::models::{
    Appointment, AppointmentConfirmation, AppointmentStatus, BookAppointmentRequest, BookingError,
    SlotDecision, UpdateStatusRequest,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle;
use crate::services::notification::NotificationService;
use crate::services::slots;

pub struct BookingService {
    supabase: Arc<SupabaseClient>,
    conflict_service: ConflictDetectionService,
    provider_service: ProviderService,
    notification_service: NotificationService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let notification_service = NotificationService::new(Arc::clone(&supabase));

        Self {
            conflict_service: ConflictDetectionService::new(config),
            provider_service: ProviderService::new(config),
            notification_service,
            supabase,
        }
    }

    /// Attempt to reserve one slot.
    ///
    /// The slot re-check here and the insert are still two round trips, so
    /// the storage layer's uniqueness constraint on active
    /// (provider, date, time) rows is the authoritative guard: a 409 at
    /// insert time is the canonical conflict, whatever the re-check said.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<AppointmentConfirmation, BookingError> {
        info!(
            "Booking appointment for patient {} with provider {} on {} at {}",
            request.patient_id, request.provider_id, request.date, request.time
        );

        let normalized_time = slots::normalize_time(&request.time).ok_or_else(|| {
            BookingError::ValidationError(format!("Invalid appointment time: {}", request.time))
        })?;

        let provider = self
            .provider_service
            .get_provider(request.provider_id, auth_token)
            .await
            .map_err(map_provider_error)?;

        self.ensure_patient(request.patient_id, auth_token).await?;

        // Re-check as close to the write as possible.
        let decision = self
            .conflict_service
            .check_requested(request.provider_id, request.date, &normalized_time, auth_token)
            .await?;

        match decision {
            SlotDecision::Bookable => {}
            SlotDecision::DayInactive => return Err(BookingError::DayInactive),
            SlotDecision::TimeOutOfBounds => return Err(BookingError::TimeOutOfBounds),
            SlotDecision::FullyBooked { alternatives } => {
                return Err(BookingError::SlotConflict { alternatives });
            }
        }

        let appointment = match self
            .insert_appointment(&request, &normalized_time, auth_token)
            .await
        {
            Ok(appointment) => appointment,
            Err(BookingError::SlotConflict { .. }) => {
                // Lost the race after the pre-check. Re-derive the day so the
                // conflict still carries the remaining open slots.
                let alternatives = self
                    .remaining_open_slots(request.provider_id, request.date, &normalized_time, auth_token)
                    .await?;
                return Err(BookingError::SlotConflict { alternatives });
            }
            Err(e) => return Err(e),
        };

        // Best effort only: a failed notification never rolls back the
        // reservation.
        if let Err(e) = self
            .notification_service
            .notify_new_request(provider.user_id, &appointment, auth_token)
            .await
        {
            warn!("Failed to notify provider {} of appointment {}: {}", provider.id, appointment.id, e);
        }

        info!("Appointment {} booked with provider {}", appointment.id, provider.id);

        Ok(AppointmentConfirmation {
            appointment,
            provider_name: provider.full_name,
            specialty: provider.specialty,
        })
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(BookingError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    pub async fn list_for_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, BookingError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=appointment_date.desc,appointment_time.asc",
            patient_id
        );
        self.fetch_appointments(&path, auth_token).await
    }

    pub async fn list_for_provider(
        &self,
        provider_id: Uuid,
        date: Option<NaiveDate>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, BookingError> {
        let mut path = format!(
            "/rest/v1/appointments?provider_id=eq.{}&order=appointment_date.desc,appointment_time.asc",
            provider_id
        );
        if let Some(date) = date {
            path.push_str(&format!("&appointment_date=eq.{}", date));
        }
        self.fetch_appointments(&path, auth_token).await
    }

    /// Lifecycle transition by the owning provider (patients may only cancel
    /// their own appointments). Ownership is checked against the caller's
    /// identity before the write.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        request: UpdateStatusRequest,
        caller_user_id: &str,
        caller_is_admin: bool,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let current = self.get_appointment(appointment_id, auth_token).await?;

        lifecycle::validate_transition(current.status, request.status)?;

        if !caller_is_admin {
            self.verify_transition_ownership(&current, request.status, caller_user_id, auth_token)
                .await?;
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({ "status": request.status })),
                Some(headers),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(BookingError::DatabaseError("Failed to update appointment".to_string()));
        }

        let updated: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse appointment: {}", e)))?;

        info!("Appointment {} moved from {} to {}", appointment_id, current.status, updated.status);
        Ok(updated)
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    /// Patients are normally created at signup; the booking path creates the
    /// row lazily when it is missing.
    async fn ensure_patient(&self, patient_id: Uuid, auth_token: &str) -> Result<(), BookingError> {
        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if !result.is_empty() {
            return Ok(());
        }

        debug!("Patient {} missing, creating lazily", patient_id);
        let created: Vec<Value> = self
            .supabase
            .insert_returning(
                "/rest/v1/patients",
                Some(auth_token),
                json!({ "id": patient_id }),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if created.is_empty() {
            return Err(BookingError::PatientNotFound);
        }

        Ok(())
    }

    async fn insert_appointment(
        &self,
        request: &BookAppointmentRequest,
        normalized_time: &str,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let body = json!({
            "provider_id": request.provider_id,
            "patient_id": request.patient_id,
            "appointment_date": request.date,
            "appointment_time": normalized_time,
            "status": AppointmentStatus::Requested,
            "reason": request.reason.clone(),
            "channel": request.channel,
        });

        let result: Vec<Value> = self
            .supabase
            .insert_returning("/rest/v1/appointments", Some(auth_token), body)
            .await
            .map_err(|e| {
                if is_conflict_error(&e) {
                    // The unique constraint is the source of truth; the
                    // caller fills in the remaining alternatives.
                    BookingError::SlotConflict { alternatives: vec![] }
                } else {
                    BookingError::DatabaseError(e.to_string())
                }
            })?;

        if result.is_empty() {
            return Err(BookingError::DatabaseError("Failed to create appointment".to_string()));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    /// Open slots for the day excluding the time that just conflicted. The
    /// losing writer may see a stale schedule, so the contested time is
    /// filtered out explicitly rather than trusted to read back as taken.
    async fn remaining_open_slots(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        conflicted_time: &str,
        auth_token: &str,
    ) -> Result<Vec<String>, BookingError> {
        let schedule = self
            .conflict_service
            .day_schedule(provider_id, date, auth_token)
            .await?;

        Ok(schedule
            .slots
            .into_iter()
            .filter(|s| s.available && s.time != conflicted_time)
            .map(|s| s.time)
            .collect())
    }

    async fn verify_transition_ownership(
        &self,
        appointment: &Appointment,
        target: AppointmentStatus,
        caller_user_id: &str,
        auth_token: &str,
    ) -> Result<(), BookingError> {
        // Patients may cancel what they booked; everything else belongs to
        // the owning provider.
        if target == AppointmentStatus::Cancelled
            && appointment.patient_id.to_string() == caller_user_id
        {
            return Ok(());
        }

        let provider = self.owning_provider(appointment.provider_id, auth_token).await?;
        if provider.user_id.to_string() != caller_user_id {
            return Err(BookingError::Unauthorized);
        }

        Ok(())
    }

    async fn owning_provider(
        &self,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<Provider, BookingError> {
        self.provider_service
            .get_provider(provider_id, auth_token)
            .await
            .map_err(map_provider_error)
    }

    async fn fetch_appointments(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, BookingError> {
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse appointments: {}", e)))
    }
}

fn map_provider_error(e: ProviderError) -> BookingError {
    match e {
        ProviderError::NotFound { query } => BookingError::ProviderNotFound { query },
        ProviderError::ValidationError(msg) => BookingError::ValidationError(msg),
        ProviderError::DatabaseError(msg) => BookingError::DatabaseError(msg),
    }
}
