use chrono::{Datelike, NaiveDate};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::error::SchedulingError;
use crate::models::{BlockedTime, Professional, ServiceOffering, TimeSlot, WorkingHoursRule};
use crate::services::bounded;

/// Read-side lookup of a professional's calendar rules. No booking
/// knowledge; the conflict and availability services layer on top.
pub struct CalendarService {
    supabase: Arc<SupabaseClient>,
    timeout_seconds: u64,
}

impl CalendarService {
    pub fn new(supabase: Arc<SupabaseClient>, config: &AppConfig) -> Self {
        Self {
            supabase,
            timeout_seconds: config.scheduling.store_timeout_seconds,
        }
    }

    pub async fn get_professional(
        &self,
        professional_id: Uuid,
        auth_token: &str,
    ) -> Result<Professional, SchedulingError> {
        let path = format!("/rest/v1/professionals?id=eq.{}", professional_id);
        let rows: Vec<Value> = bounded(
            self.timeout_seconds,
            self.supabase
                .request(Method::GET, &path, Some(auth_token), None),
        )
        .await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or(SchedulingError::ProfessionalNotFound)?;
        serde_json::from_value(row)
            .map_err(|e| SchedulingError::Store(format!("failed to parse professional: {}", e)))
    }

    /// Resolve a list of service ids against the catalog, preserving the
    /// requested order. Any unknown id fails the whole lookup.
    pub async fn services_by_ids(
        &self,
        service_ids: &[Uuid],
        auth_token: &str,
    ) -> Result<Vec<ServiceOffering>, SchedulingError> {
        if service_ids.is_empty() {
            return Ok(vec![]);
        }

        let id_list = service_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let path = format!("/rest/v1/services?id=in.({})", id_list);

        let rows: Vec<Value> = bounded(
            self.timeout_seconds,
            self.supabase
                .request(Method::GET, &path, Some(auth_token), None),
        )
        .await?;

        let found: Vec<ServiceOffering> = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ServiceOffering>, _>>()
            .map_err(|e| SchedulingError::Store(format!("failed to parse services: {}", e)))?;

        service_ids
            .iter()
            .map(|id| {
                found
                    .iter()
                    .find(|svc| svc.id == *id)
                    .cloned()
                    .ok_or(SchedulingError::ServiceNotFound)
            })
            .collect()
    }

    /// Open intervals for the given local date: the weekday schedule minus
    /// the configured break and any blocked-time entries. Disjoint, sorted,
    /// possibly empty (professional does not work that day).
    pub async fn working_windows(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<TimeSlot>, SchedulingError> {
        // NotFound only when the professional itself is missing; an empty
        // schedule is a normal answer.
        self.get_professional(professional_id, auth_token).await?;

        let weekday = date.weekday().num_days_from_sunday() as i32;
        let rules = self
            .working_hours_for_weekday(professional_id, weekday, auth_token)
            .await?;
        let blocks = self
            .blocked_times_for_date(professional_id, date, auth_token)
            .await?;

        let mut windows: Vec<TimeSlot> = rules
            .iter()
            .flat_map(|rule| rule_windows(rule, date))
            .collect();
        windows.sort_by_key(|w| w.start_time);

        for block in &blocks {
            windows = subtract_interval(windows, &block.as_slot());
        }

        debug!(
            "Professional {} has {} open windows on {}",
            professional_id,
            windows.len(),
            date
        );
        Ok(windows)
    }

    async fn working_hours_for_weekday(
        &self,
        professional_id: Uuid,
        weekday: i32,
        auth_token: &str,
    ) -> Result<Vec<WorkingHoursRule>, SchedulingError> {
        let path = format!(
            "/rest/v1/working_hours?professional_id=eq.{}&weekday=eq.{}&order=opens_at.asc",
            professional_id, weekday
        );

        let rows: Vec<Value> = bounded(
            self.timeout_seconds,
            self.supabase
                .request(Method::GET, &path, Some(auth_token), None),
        )
        .await?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<WorkingHoursRule>, _>>()
            .map_err(|e| SchedulingError::Store(format!("failed to parse working hours: {}", e)))
    }

    async fn blocked_times_for_date(
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

/// Expand one weekday rule into concrete open intervals on `date`,
/// splitting around the break when one is configured.
pub fn rule_windows(rule: &WorkingHoursRule, date: NaiveDate) -> Vec<TimeSlot> {
    if rule.opens_at >= rule.closes_at {
        return vec![];
    }

    let at = |t: chrono::NaiveTime| date.and_time(t).and_utc();
    let full = TimeSlot::new(at(rule.opens_at), at(rule.closes_at));

    match (rule.break_start, rule.break_end) {
        (Some(break_start), Some(break_end)) if break_start < break_end => {
            subtract_interval(vec![full], &TimeSlot::new(at(break_start), at(break_end)))
        }
        _ => vec![full],
    }
}

/// Remove `hole` from every window, keeping the leftover pieces ordered.
pub fn subtract_interval(windows: Vec<TimeSlot>, hole: &TimeSlot) -> Vec<TimeSlot> {
    let mut result = Vec::with_capacity(windows.len() + 1);

    for window in windows {
        if hole.end_time <= window.start_time || window.end_time <= hole.start_time {
            result.push(window);
            continue;
        }
        if window.start_time < hole.start_time {
            result.push(TimeSlot::new(window.start_time, hole.start_time));
        }
        if hole.end_time < window.end_time {
            result.push(TimeSlot::new(hole.end_time, window.end_time));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone, Utc};

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
    }

    fn slot(start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> TimeSlot {
        TimeSlot::new(
            Utc.with_ymd_and_hms(2026, 9, 1, start_h, start_m, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 9, 1, end_h, end_m, 0).unwrap(),
        )
    }

    fn rule(
        opens: NaiveTime,
        closes: NaiveTime,
        break_times: Option<(NaiveTime, NaiveTime)>,
    ) -> WorkingHoursRule {
        WorkingHoursRule {
            id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            weekday: 2,
            opens_at: opens,
            closes_at: closes,
            break_start: break_times.map(|b| b.0),
            break_end: break_times.map(|b| b.1),
        }
    }

    #[test]
    fn rule_without_break_is_one_window() {
        let windows = rule_windows(&rule(time(9, 0), time(17, 0), None), date());
        assert_eq!(windows, vec![slot(9, 0, 17, 0)]);
    }

    #[test]
    fn break_splits_the_day() {
        let windows = rule_windows(
            &rule(time(9, 0), time(12, 0), Some((time(10, 0), time(10, 15)))),
            date(),
        );
        assert_eq!(windows, vec![slot(9, 0, 10, 0), slot(10, 15, 12, 0)]);
    }

    #[test]
    fn inverted_hours_yield_no_windows() {
        assert!(rule_windows(&rule(time(17, 0), time(9, 0), None), date()).is_empty());
    }

    #[test]
    fn subtract_interval_trims_overlap() {
        let windows = vec![slot(9, 0, 12, 0)];
        assert_eq!(
            subtract_interval(windows, &slot(11, 0, 13, 0)),
            vec![slot(9, 0, 11, 0)]
        );
    }

    #[test]
    fn subtract_interval_can_swallow_window() {
        let windows = vec![slot(9, 0, 12, 0), slot(14, 0, 18, 0)];
        assert_eq!(
            subtract_interval(windows, &slot(8, 0, 13, 0)),
            vec![slot(14, 0, 18, 0)]
        );
    }

    #[test]
    fn subtract_interval_ignores_touching_hole() {
        let windows = vec![slot(9, 0, 12, 0)];
        assert_eq!(
            subtract_interval(windows, &slot(12, 0, 13, 0)),
            vec![slot(9, 0, 12, 0)]
        );
    }
}
