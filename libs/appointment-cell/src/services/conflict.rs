use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use provider_cell::services::availability::{parse_time_of_day, AvailabilityService};
use provider_cell::DayOfWeek;

use crate::models::{Appointment, BookingError, DaySchedule, SlotDecision};
use crate::services::slots;

/// Marks generated slots against existing reservations and classifies
/// requested times. Runs one availability lookup and (when the day is open)
/// one appointment fetch; the day-inactive case never touches appointments.
pub struct ConflictDetectionService {
    supabase: Arc<SupabaseClient>,
    availability: AvailabilityService,
}

impl ConflictDetectionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            availability: AvailabilityService::new(config),
        }
    }

    /// Full day view for a provider and date.
    pub async fn day_schedule(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<DaySchedule, BookingError> {
        let day = DayOfWeek::from_date(date);
        debug!("Building day schedule for provider {} on {} ({})", provider_id, date, day);

        let window = self
            .availability
            .get_active_for_day(provider_id, day, auth_token)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let Some(window) = window else {
            // Closed day: short-circuit before any appointment fetch.
            return Ok(slots::inactive_day_schedule());
        };

        let start = parse_time_of_day(&window.start_time).ok_or_else(|| {
            BookingError::DatabaseError(format!("Unparseable start time: {}", window.start_time))
        })?;
        let end = parse_time_of_day(&window.end_time).ok_or_else(|| {
            BookingError::DatabaseError(format!("Unparseable end time: {}", window.end_time))
        })?;

        let taken = self
            .slot_holding_times(provider_id, date, auth_token)
            .await?;

        Ok(slots::build_day_schedule(start, end, &taken))
    }

    /// Classify one requested time for the date. Used both for the
    /// availability pre-check and for the commit-time re-check.
    pub async fn check_requested(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        requested_time: &str,
        auth_token: &str,
    ) -> Result<SlotDecision, BookingError> {
        let schedule = self.day_schedule(provider_id, date, auth_token).await?;
        Ok(slots::classify_request(&schedule, requested_time))
    }

    /// Times of appointments still holding a slot on the date
    /// (status requested or confirmed).
    async fn slot_holding_times(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<String>, BookingError> {
        let path = format!(
            "/rest/v1/appointments?provider_id=eq.{}&appointment_date=eq.{}&status=in.(requested,confirmed)&order=appointment_time.asc",
            provider_id, date
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let appointments: Vec<Appointment> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse appointments: {}", e)))?;

        Ok(appointments
            .into_iter()
            .filter(|apt| apt.status.holds_slot())
            .map(|apt| apt.appointment_time)
            .collect())
    }
}
