use chrono::NaiveTime;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{DayOfWeek, ProviderAvailability, ProviderError, UpsertAvailabilityRequest};

/// Accepts both the store's `HH:MM:SS` representation and the `HH:MM` form
/// used by API callers.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

pub struct AvailabilityService {
    supabase: SupabaseClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Replace a provider's weekly schedule rows. Keyed on
    /// (provider_id, day_of_week) so repeated upserts never accumulate
    /// duplicate rows for the same day.
    pub async fn upsert_weekly(
        &self,
        provider_id: Uuid,
        request: UpsertAvailabilityRequest,
        auth_token: &str,
    ) -> Result<Vec<ProviderAvailability>, ProviderError> {
        debug!("Upserting {} availability rows for provider {}", request.days.len(), provider_id);

        if request.days.is_empty() {
            return Err(ProviderError::ValidationError(
                "At least one availability day is required".to_string(),
            ));
        }

        let mut rows = Vec::with_capacity(request.days.len());
        for day in &request.days {
            let start = parse_time_of_day(&day.start_time).ok_or_else(|| {
                ProviderError::ValidationError(format!("Invalid start time: {}", day.start_time))
            })?;
            let end = parse_time_of_day(&day.end_time).ok_or_else(|| {
                ProviderError::ValidationError(format!("Invalid end time: {}", day.end_time))
            })?;

            if start >= end {
                return Err(ProviderError::ValidationError(
                    "Start time must be before end time".to_string(),
                ));
            }

            rows.push(json!({
                "provider_id": provider_id,
                "day_of_week": day.day_of_week,
                "start_time": start.format("%H:%M:%S").to_string(),
                "end_time": end.format("%H:%M:%S").to_string(),
                "is_active": day.is_active,
            }));
        }

        let path = "/rest/v1/provider_availability?on_conflict=provider_id,day_of_week";
        let result: Vec<Value> = self
            .supabase
            .upsert_returning(path, Some(auth_token), Value::Array(rows))
            .await
            .map_err(|e| ProviderError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ProviderAvailability>, _>>()
            .map_err(|e| ProviderError::DatabaseError(format!("Failed to parse availability: {}", e)))
    }

    pub async fn get_weekly(
        &self,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<ProviderAvailability>, ProviderError> {
        let path = format!(
            "/rest/v1/provider_availability?provider_id=eq.{}&order=day_of_week.asc",
            provider_id
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ProviderError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ProviderAvailability>, _>>()
            .map_err(|e| ProviderError::DatabaseError(format!("Failed to parse availability: {}", e)))
    }

    /// The single active window for one weekday, or None when the day is
    /// closed. The invariant of one active row per (provider, day) is
    /// maintained by the upsert key, so first-row selection is safe.
    pub async fn get_active_for_day(
        &self,
        provider_id: Uuid,
        day: DayOfWeek,
        auth_token: &str,
    ) -> Result<Option<ProviderAvailability>, ProviderError> {
        let path = format!(
            "/rest/v1/provider_availability?provider_id=eq.{}&day_of_week=eq.{}&is_active=eq.true",
            provider_id, day
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ProviderError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map(Some)
                .map_err(|e| ProviderError::DatabaseError(format!("Failed to parse availability: {}", e))),
            None => Ok(None),
        }
    }
}
