use crate::error::SchedulingError;
use crate::models::AppointmentStatus;

/// An appointment is created `scheduled` and moves exactly once to
/// `completed` or `cancelled`. Start, end and professional are immutable
/// after creation; a change means cancel and re-book.
pub fn validate_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<(), SchedulingError> {
    use AppointmentStatus::*;

    match (from, to) {
        (Scheduled, Completed) | (Scheduled, Cancelled) => Ok(()),
        (Cancelled, _) => Err(SchedulingError::AlreadyCancelled),
        (Completed, _) => Err(SchedulingError::InvalidStatusTransition(Completed)),
        (Scheduled, Scheduled) => Err(SchedulingError::InvalidStatusTransition(Scheduled)),
    }
}
