use thiserror::Error;

use shared_database::StoreError;
use shared_models::AppError;

use crate::models::AppointmentStatus;

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Appointment is already cancelled")]
    AlreadyCancelled,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Requested slot conflicts with an existing booking")]
    Conflict,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transient store failure: {0}")]
    Transient(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<StoreError> for SchedulingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout | StoreError::Connection(_) => {
                SchedulingError::Transient(err.to_string())
            }
            // PostgREST reports exclusion-constraint violations as 409.
            StoreError::Status { status: 409, .. } => SchedulingError::Conflict,
            StoreError::Status { .. } | StoreError::Decode(_) => {
                SchedulingError::Store(err.to_string())
            }
        }
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match &err {
            SchedulingError::ProfessionalNotFound
            | SchedulingError::ServiceNotFound
            | SchedulingError::AppointmentNotFound => AppError::NotFound(err.to_string()),
            SchedulingError::AlreadyCancelled
            | SchedulingError::InvalidStatusTransition(_)
            | SchedulingError::Conflict => AppError::Conflict(err.to_string()),
            SchedulingError::Validation(msg) => AppError::ValidationError(msg.clone()),
            SchedulingError::Transient(msg) => AppError::Unavailable(msg.clone()),
            SchedulingError::Store(msg) => AppError::Database(msg.clone()),
        }
    }
}
