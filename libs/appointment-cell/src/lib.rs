pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    Appointment, AppointmentConfirmation, AppointmentStatus, BookAppointmentRequest,
    BookingChannel, BookingError, DaySchedule, Slot, SlotDecision, UnavailableReason,
};
