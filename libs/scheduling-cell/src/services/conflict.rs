use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::error::SchedulingError;
use crate::models::{day_bounds, Appointment, BlockedTime, ConflictCheckResponse, TimeSlot};
use crate::services::bounded;

/// Half-open interval overlap: touching endpoints do not conflict, so a
/// booking ending 10:30 composes with one starting 10:30.
pub fn overlaps(a: &TimeSlot, b: &TimeSlot) -> bool {
    a.start_time < b.end_time && b.start_time < a.end_time
}

/// O(n) scan over the existing busy set; n is bookings-per-day small.
pub fn has_conflict(candidate: &TimeSlot, existing: &[TimeSlot]) -> bool {
    existing.iter().any(|busy| overlaps(candidate, busy))
}

/// Read side of conflict detection: fetches the busy set for a professional
/// and applies the pure overlap predicate. The write path re-checks inside
/// the store transaction; this service is advisory.
pub struct ConflictService {
    supabase: Arc<SupabaseClient>,
    timeout_seconds: u64,
}

impl ConflictService {
    pub fn new(supabase: Arc<SupabaseClient>, config: &AppConfig) -> Self {
        Self {
            supabase,
            timeout_seconds: config.scheduling.store_timeout_seconds,
        }
    }

    /// All intervals blocking new bookings on `date`: non-cancelled
    /// appointments plus blocked-time entries. Fetched once per call so the
    /// availability walk does not re-query per candidate.
    pub async fn busy_intervals(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<TimeSlot>, SchedulingError> {
        let appointments = self
            .appointments_overlapping_day(professional_id, date, auth_token)
            .await?;
        let blocks = self.blocked_times(professional_id, date, auth_token).await?;

        let mut busy: Vec<TimeSlot> = appointments
            .iter()
            .filter(|apt| apt.status.blocks_slot())
            .map(Appointment::slot)
            .chain(blocks.iter().map(BlockedTime::as_slot))
            .collect();
        busy.sort_by_key(|slot| slot.start_time);

        Ok(busy)
    }

    /// Probe a candidate interval against current bookings. Advisory only:
    /// a clean answer here can be stale by the time the caller commits.
    pub async fn check_slot(
        &self,
        professional_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<ConflictCheckResponse, SchedulingError> {
        debug!(
            "Checking conflicts for professional {} from {} to {}",
            professional_id, start_time, end_time
        );

        let candidate = TimeSlot::new(start_time, end_time);
        let appointments = self
            .appointments_in_range(professional_id, start_time, end_time, auth_token)
            .await?;

        let conflicting_appointments: Vec<Appointment> = appointments
            .into_iter()
            .filter(|apt| Some(apt.id) != exclude_appointment_id)
            .filter(|apt| apt.status.blocks_slot())
            .filter(|apt| overlaps(&candidate, &apt.slot()))
            .collect();

        let blocks = self
            .blocked_times(professional_id, start_time.date_naive(), auth_token)
            .await?;
        let blocked = blocks
            .iter()
            .any(|block| overlaps(&candidate, &block.as_slot()));

        let has_conflict = blocked || !conflicting_appointments.is_empty();
        if has_conflict {
            warn!(
                "Conflict detected for professional {} at {} ({} overlapping appointments, blocked: {})",
                professional_id,
                start_time,
                conflicting_appointments.len(),
                blocked
            );
        }

        Ok(ConflictCheckResponse {
            has_conflict,
            conflicting_appointments,
        })
    }

    async fn appointments_overlapping_day(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let (day_start, day_end) = day_bounds(date);
        self.appointments_in_range(professional_id, day_start, day_end, auth_token)
            .await
    }

    async fn appointments_in_range(
        &self,
        professional_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        // Range filter keeps the payload small; exact overlap semantics are
        // applied in-process by the pure predicate.
        let path = format!(
            "/rest/v1/appointments?professional_id=eq.{}&starts_at=lte.{}&ends_at=gte.{}&order=starts_at.asc",
            professional_id,
            urlencoding::encode(&end_time.to_rfc3339()),
            urlencoding::encode(&start_time.to_rfc3339()),
        );

        let rows: Vec<Value> = bounded(
            self.timeout_seconds,
            self.supabase
                .request(Method::GET, &path, Some(auth_token), None),
        )
        .await?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| SchedulingError::Store(format!("failed to parse appointments: {}", e)))
    }

    async fn blocked_times(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<BlockedTime>, SchedulingError> {
        let path = format!(
            "/rest/v1/blocked_times?professional_id=eq.{}&blocked_on=eq.{}",
            professional_id, date
        );

        let rows: Vec<Value> = bounded(
            self.timeout_seconds,
            self.supabase
                .request(Method::GET, &path, Some(auth_token), None),
        )
        .await?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<BlockedTime>, _>>()
            .map_err(|e| SchedulingError::Store(format!("failed to parse blocked times: {}", e)))
    }
}
