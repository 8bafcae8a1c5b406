// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

/// A half-open `[start, end)` interval. Doubles as the transient slot value
/// offered by the availability generator; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl TimeSlot {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: Uuid,
    pub full_name: String,
    pub timezone: String,
    pub is_active: bool,
}

/// One row of a professional's weekly schedule. Wall-clock times for the
/// establishment's day; `weekday` follows the store convention 0 = Sunday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHoursRule {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub weekday: i32,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub price_cents: i64,
}

/// A date-scoped interval during which no booking may be created. Behaves
/// like an implicit appointment for conflict purposes but carries no client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedTime {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub blocked_on: NaiveDate,
    pub full_day: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub reason: Option<String>,
}

impl BlockedTime {
    /// Concrete busy interval for conflict checking. Partial blocks missing
    /// either bound are treated as full-day, `[midnight, next midnight)`.
    pub fn as_slot(&self) -> TimeSlot {
        match (self.full_day, self.start_time, self.end_time) {
            (false, Some(start), Some(end)) => TimeSlot::new(
                self.blocked_on.and_time(start).and_utc(),
                self.blocked_on.and_time(end).and_utc(),
            ),
            _ => {
                let (start, end) = day_bounds(self.blocked_on);
                TimeSlot::new(start, end)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub client_name: String,
    pub client_phone: String,
    pub client_account_id: Option<Uuid>,
    pub service_ids: Vec<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub cancelled_by: Option<CancelledBy>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn slot(&self) -> TimeSlot {
        TimeSlot::new(self.starts_at, self.ends_at)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Cancelled rows are history only; everything else blocks the slot.
    pub fn blocks_slot(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Completed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    Client,
    Staff,
    System,
}

impl fmt::Display for CancelledBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelledBy::Client => write!(f, "client"),
            CancelledBy::Staff => write!(f, "staff"),
            CancelledBy::System => write!(f, "system"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub phone: String,
    pub account_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub professional_id: Uuid,
    pub client: ClientInfo,
    /// Ordered list of services booked back-to-back; commonly one.
    pub service_ids: Vec<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub cancelled_by: CancelledBy,
    pub reason: Option<String>,
}

/// Result of a read-side conflict probe; diagnostic detail for staff tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    pub conflicting_appointments: Vec<Appointment>,
}

// ==============================================================================
// CHANGE NOTIFICATION EVENTS
// ==============================================================================

/// Broadcast after a committed state change. Consumers must treat these as
/// "invalidate and refetch" signals, never as authoritative deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppointmentEvent {
    Created { appointment: Appointment },
    Cancelled { appointment: Appointment },
    Completed { appointment: Appointment },
}

impl AppointmentEvent {
    pub fn appointment(&self) -> &Appointment {
        match self {
            AppointmentEvent::Created { appointment }
            | AppointmentEvent::Cancelled { appointment }
            | AppointmentEvent::Completed { appointment } => appointment,
        }
    }

    pub fn professional_id(&self) -> Uuid {
        self.appointment().professional_id
    }
}

// ==============================================================================
// HELPERS
// ==============================================================================

pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    (start, start + Duration::days(1))
}
