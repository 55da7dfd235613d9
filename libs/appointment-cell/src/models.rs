// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_date: NaiveDate,
    /// Time-of-day as stored (`HH:MM:SS` or `HH:MM`); normalized to `HH:MM`
    /// wherever two times are compared.
    pub appointment_time: String,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub channel: BookingChannel,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Requested,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    /// Statuses that hold a slot. Cancelled/completed/no-show appointments
    /// free their slot for rebooking.
    pub fn holds_slot(&self) -> bool {
        matches!(self, AppointmentStatus::Requested | AppointmentStatus::Confirmed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Requested => write!(f, "requested"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingChannel {
    Voice,
    Manual,
}

impl fmt::Display for BookingChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingChannel::Voice => write!(f, "voice"),
            BookingChannel::Manual => write!(f, "manual"),
        }
    }
}

// ==============================================================================
// SLOT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    pub time: String,
    pub available: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    DayInactive,
    TimeOutOfBounds,
    FullyBooked,
}

/// The day view returned to callers: whether anything is open, why not,
/// and the per-slot breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnavailableReason>,
    pub slots: Vec<Slot>,
}

/// Three-way classification of one requested time against a day's slots.
/// Downstream behavior differs per variant (what alternatives to offer),
/// so this is a first-class result rather than a boolean.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum SlotDecision {
    Bookable,
    DayInactive,
    TimeOutOfBounds,
    FullyBooked { alternatives: Vec<String> },
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub provider_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    pub reason: Option<String>,
    pub channel: BookingChannel,
}

/// Booking result with the provider's display fields joined in, so the
/// caller can render a confirmation without a second round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentConfirmation {
    pub appointment: Appointment,
    pub provider_name: String,
    pub specialty: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub provider_id: Uuid,
    pub date: NaiveDate,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("Appointment not found")]
    NotFound,

    #[error("No provider matched \"{query}\"")]
    ProviderNotFound { query: String },

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Requested slot is already booked")]
    SlotConflict { alternatives: Vec<String> },

    #[error("Provider has no availability on the requested day")]
    DayInactive,

    #[error("Requested time is outside the provider's bookable slots")]
    TimeOutOfBounds,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
