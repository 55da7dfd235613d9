// libs/provider-cell/src/models.rs
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE PROVIDER MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub specialty: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Weekday label as stored in the `provider_availability` table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        };
        write!(f, "{}", label)
    }
}

/// One weekly-recurring open window. At most one active row exists per
/// (provider, day_of_week); upserts replace rather than append.
///
/// Times are kept as the store's text representation (`HH:MM:SS` or `HH:MM`)
/// and parsed where the slot arithmetic happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAvailability {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    pub is_active: bool,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityDayInput {
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertAvailabilityRequest {
    pub days: Vec<AvailabilityDayInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveQuery {
    pub q: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedProvider {
    pub provider: Provider,
    pub confidence: f32,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("No provider matched \"{query}\"")]
    NotFound { query: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
