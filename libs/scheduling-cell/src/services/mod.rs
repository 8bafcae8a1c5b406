pub mod availability;
pub mod booking;
pub mod calendar;
pub mod conflict;
pub mod lifecycle;
pub mod notifier;

use std::future::Future;
use std::time::Duration;

use shared_database::StoreError;

use crate::error::SchedulingError;

/// Bound a store round-trip so a stalled backend surfaces as a transient
/// failure instead of hanging the caller.
pub(crate) async fn bounded<T, F>(timeout_seconds: u64, fut: F) -> Result<T, SchedulingError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_seconds), fut).await {
        Ok(result) => result.map_err(SchedulingError::from),
        Err(_) => Err(SchedulingError::Transient(
            "store request timed out".to_string(),
        )),
    }
}
