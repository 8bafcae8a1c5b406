use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_config::{AppConfig, SchedulingConfig};
use shared_database::SupabaseClient;

use crate::error::SchedulingError;
use crate::models::TimeSlot;
use crate::services::calendar::CalendarService;
use crate::services::conflict::{has_conflict, ConflictService};

/// Generates the ordered list of bookable start times for a professional,
/// date and total service duration. The output is a point-in-time snapshot:
/// it carries no reservation and any slot can be invalidated by a concurrent
/// booking before the client acts on it.
pub struct AvailabilityService {
    calendar: CalendarService,
    conflict: ConflictService,
    rules: SchedulingConfig,
}

impl AvailabilityService {
    pub fn new(supabase: Arc<SupabaseClient>, config: &AppConfig) -> Self {
        Self {
            calendar: CalendarService::new(Arc::clone(&supabase), config),
            conflict: ConflictService::new(supabase, config),
            rules: config.scheduling.clone(),
        }
    }

    /// Candidate starts walk each open window in `step_minutes` increments;
    /// a start is offered when the whole slot fits in the window and the
    /// busy set (fetched once) reports no conflict.
    pub async fn available_slots(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        total_duration_minutes: i64,
        step_minutes: Option<i64>,
        auth_token: &str,
    ) -> Result<Vec<TimeSlot>, SchedulingError> {
        if total_duration_minutes <= 0 {
            return Err(SchedulingError::Validation(
                "total duration must be positive".to_string(),
            ));
        }
        let step = step_minutes.unwrap_or(self.rules.slot_step_minutes);
        if step <= 0 {
            return Err(SchedulingError::Validation(
                "step must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let horizon = (now + Duration::days(self.rules.max_advance_days)).date_naive();
        if date > horizon {
            debug!("Date {} is beyond the booking horizon, no slots", date);
            return Ok(vec![]);
        }

        let windows = self
            .calendar
            .working_windows(professional_id, date, auth_token)
            .await?;
        if windows.is_empty() {
            return Ok(vec![]);
        }

        let busy = self
            .conflict
            .busy_intervals(professional_id, date, auth_token)
            .await?;

        let earliest_start = now + Duration::minutes(self.rules.min_lead_minutes);
        let slots = slots_in_windows(
            &windows,
            &busy,
            total_duration_minutes,
            step,
            earliest_start,
        );

        debug!(
            "Professional {} has {} bookable slots on {}",
            professional_id,
            slots.len(),
            date
        );
        Ok(slots)
    }

    /// Availability for an ordered list of services booked back-to-back.
    pub async fn available_slots_for_services(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        service_ids: &[Uuid],
        step_minutes: Option<i64>,
        auth_token: &str,
    ) -> Result<Vec<TimeSlot>, SchedulingError> {
        if service_ids.is_empty() {
            return Err(SchedulingError::Validation(
                "at least one service is required".to_string(),
            ));
        }

        let services = self.calendar.services_by_ids(service_ids, auth_token).await?;
        let total: i64 = services.iter().map(|svc| svc.duration_minutes as i64).sum();

        self.available_slots(professional_id, date, total, step_minutes, auth_token)
            .await
    }
}

/// Pure slot walk. `earliest_start` drops candidates in the past or inside
/// the lead-time buffer; a duration longer than every window yields an empty
/// result rather than an error.
pub fn slots_in_windows(
    windows: &[TimeSlot],
    busy: &[TimeSlot],
    duration_minutes: i64,
    step_minutes: i64,
    earliest_start: DateTime<Utc>,
) -> Vec<TimeSlot> {
    let duration = Duration::minutes(duration_minutes);
    let step = Duration::minutes(step_minutes);
    let mut slots = Vec::new();

    for window in windows {
        let mut start = window.start_time;
        while start + duration <= window.end_time {
            let candidate = TimeSlot::new(start, start + duration);
            if start >= earliest_start && !has_conflict(&candidate, busy) {
                slots.push(candidate);
            }
            start += step;
        }
    }

    slots
}
