use crate::models::{AppointmentStatus, BookingError};

/// Allowed status transitions. Patients create appointments in `requested`;
/// the owning provider moves them forward from there.
pub fn validate_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<(), BookingError> {
    use AppointmentStatus::*;

    let allowed = matches!(
        (from, to),
        (Requested, Confirmed)
            | (Requested, Cancelled)
            | (Confirmed, Completed)
            | (Confirmed, Cancelled)
            | (Confirmed, NoShow)
    );

    if allowed {
        Ok(())
    } else {
        Err(BookingError::InvalidStatusTransition { from, to })
    }
}
