// libs/scheduling-cell/src/services/booking.rs
use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::{AppConfig, SchedulingConfig};
use shared_database::SupabaseClient;

use crate::error::SchedulingError;
use crate::models::{
    day_bounds, Appointment, AppointmentEvent, AppointmentStatus, BookAppointmentRequest,
    CancelAppointmentRequest,
};
use crate::services::bounded;
use crate::services::calendar::CalendarService;
use crate::services::conflict::ConflictService;
use crate::services::lifecycle;
use crate::services::notifier::ChangeNotifier;

/// The only component allowed to create or close appointments. Availability
/// output is advisory; the no-overlap invariant is enforced here, at commit
/// time, by the store's atomic insert-if-no-conflict operation.
pub struct BookingService {
    supabase: Arc<SupabaseClient>,
    calendar: CalendarService,
    conflict: ConflictService,
    notifier: Arc<ChangeNotifier>,
    rules: SchedulingConfig,
    timeout_seconds: u64,
}

impl BookingService {
    pub fn new(config: &AppConfig, notifier: Arc<ChangeNotifier>) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self {
            calendar: CalendarService::new(Arc::clone(&supabase), config),
            conflict: ConflictService::new(Arc::clone(&supabase), config),
            supabase,
            notifier,
            rules: config.scheduling.clone(),
            timeout_seconds: config.scheduling.store_timeout_seconds,
        }
    }

    /// Validate, pre-check, then commit through the store's
    /// `create_appointment_if_free` RPC. Two concurrent overlapping requests
    /// cannot both pass the RPC; the loser gets `Conflict` and nothing is
    /// created.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        info!(
            "Booking appointment for professional {} at {}",
            request.professional_id, request.starts_at
        );

        let total_duration = self.validate_booking_request(&request, auth_token).await?;
        let ends_at = request.starts_at + Duration::minutes(total_duration);

        // Advisory pre-check: fail fast on an obviously taken slot. The RPC
        // below remains the authority under concurrency.
        let probe = self
            .conflict
            .check_slot(
                request.professional_id,
                request.starts_at,
                ends_at,
                None,
                auth_token,
            )
            .await?;
        if probe.has_conflict {
            warn!(
                "Pre-check found a conflict for professional {} at {}",
                request.professional_id, request.starts_at
            );
            return Err(SchedulingError::Conflict);
        }

        let appointment = self
            .commit_appointment(&request, ends_at, auth_token)
            .await?;

        // After commit and never gating the response.
        self.notifier
            .publish(AppointmentEvent::Created {
                appointment: appointment.clone(),
            })
            .await;

        info!("Appointment {} booked successfully", appointment.id);
        Ok(appointment)
    }

    /// Cancel via compare-and-swap on `status=scheduled`. Cancelling an
    /// already-cancelled appointment reports `AlreadyCancelled` so callers
    /// can tell "my action took effect" from "someone beat me to it".
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        request: CancelAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Cancelling appointment {}", appointment_id);

        let patch = json!({
            "status": AppointmentStatus::Cancelled,
            "cancelled_by": request.cancelled_by,
            "cancellation_reason": request.reason,
            "updated_at": Utc::now().to_rfc3339(),
        });

        match self
            .transition_if_scheduled(appointment_id, patch, auth_token)
            .await?
        {
            Some(appointment) => {
                self.notifier
                    .publish(AppointmentEvent::Cancelled {
                        appointment: appointment.clone(),
                    })
                    .await;
                info!(
                    "Appointment {} cancelled by {}",
                    appointment_id, request.cancelled_by
                );
                Ok(appointment)
            }
            None => Err(self
                .classify_failed_transition(appointment_id, AppointmentStatus::Cancelled, auth_token)
                .await),
        }
    }

    /// Normal closure, typically time-driven. Same CAS discipline as cancel:
    /// a completion racing a cancellation is resolved by whichever write
    /// lands first.
    pub async fn complete_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Completing appointment {}", appointment_id);

        let patch = json!({
            "status": AppointmentStatus::Completed,
            "updated_at": Utc::now().to_rfc3339(),
        });

        match self
            .transition_if_scheduled(appointment_id, patch, auth_token)
            .await?
        {
            Some(appointment) => {
                self.notifier
                    .publish(AppointmentEvent::Completed {
                        appointment: appointment.clone(),
                    })
                    .await;
                Ok(appointment)
            }
            None => Err(self
                .classify_failed_transition(appointment_id, AppointmentStatus::Completed, auth_token)
                .await),
        }
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Value> = bounded(
            self.timeout_seconds,
            self.supabase
                .request(Method::GET, &path, Some(auth_token), None),
        )
        .await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or(SchedulingError::AppointmentNotFound)?;
        serde_json::from_value(row)
            .map_err(|e| SchedulingError::Store(format!("failed to parse appointment: {}", e)))
    }

    /// Day sheet for the staff dashboard, cancelled rows included (history).
    pub async fn appointments_for_day(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let (day_start, day_end) = day_bounds(date);
        let path = format!(
            "/rest/v1/appointments?professional_id=eq.{}&starts_at=gte.{}&starts_at=lt.{}&order=starts_at.asc",
            professional_id,
            urlencoding::encode(&day_start.to_rfc3339()),
            urlencoding::encode(&day_end.to_rfc3339()),
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

    // ==========================================================================
    // PRIVATE HELPERS
    // ==========================================================================

    /// Returns the summed service duration in minutes once every validation
    /// gate passes. Validation rejects before any write is attempted.
    async fn validate_booking_request(
        &self,
        request: &BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<i64, SchedulingError> {
        if request.client.name.trim().is_empty() {
            return Err(SchedulingError::Validation(
                "client name is required".to_string(),
            ));
        }
        if request.service_ids.is_empty() {
            return Err(SchedulingError::Validation(
                "at least one service is required".to_string(),
            ));
        }

        let services = self
            .calendar
            .services_by_ids(&request.service_ids, auth_token)
            .await?;
        let total_duration: i64 = services.iter().map(|svc| svc.duration_minutes as i64).sum();
        if total_duration <= 0 {
            return Err(SchedulingError::Validation(
                "total service duration must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let earliest = now + Duration::minutes(self.rules.min_lead_minutes);
        if request.starts_at < earliest {
            return Err(SchedulingError::Validation(format!(
                "start time must be at least {} minutes from now",
                self.rules.min_lead_minutes
            )));
        }
        if request.starts_at > now + Duration::days(self.rules.max_advance_days) {
            return Err(SchedulingError::Validation(format!(
                "start time is beyond the {}-day booking horizon",
                self.rules.max_advance_days
            )));
        }

        let professional = self
            .calendar
            .get_professional(request.professional_id, auth_token)
            .await?;
        if !professional.is_active {
            return Err(SchedulingError::Validation(
                "professional is not accepting bookings".to_string(),
            ));
        }

        Ok(total_duration)
    }

    /// The single authoritative mutation point. The RPC re-checks blocked
    /// times and booking overlap, then inserts, all in one store
    /// transaction; a 409 maps to `Conflict` with zero rows changed.
    async fn commit_appointment(
        &self,
        request: &BookAppointmentRequest,
        ends_at: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let payload = json!({
            "p_professional_id": request.professional_id,
            "p_client_name": request.client.name,
            "p_client_phone": request.client.phone,
            "p_client_account_id": request.client.account_id,
            "p_service_ids": request.service_ids,
            "p_starts_at": request.starts_at.to_rfc3339(),
            "p_ends_at": ends_at.to_rfc3339(),
            "p_notes": request.notes,
        });

        let rows: Vec<Value> = bounded(
            self.timeout_seconds,
            self.supabase.request(
                Method::POST,
                "/rest/v1/rpc/create_appointment_if_free",
                Some(auth_token),
                Some(payload),
            ),
        )
        .await?;

        let row = rows.into_iter().next().ok_or_else(|| {
            SchedulingError::Store("booking RPC returned no appointment row".to_string())
        })?;
        serde_json::from_value(row)
            .map_err(|e| SchedulingError::Store(format!("failed to parse appointment: {}", e)))
    }

    /// PATCH filtered on the expected current status: a racing writer
    /// matches zero rows instead of silently overwriting.
    async fn transition_if_scheduled(
        &self,
        appointment_id: Uuid,
        patch: Value,
        auth_token: &str,
    ) -> Result<Option<Appointment>, SchedulingError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.{}",
            appointment_id,
            AppointmentStatus::Scheduled
        );

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let rows: Vec<Value> = bounded(
            self.timeout_seconds,
            self.supabase.request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(patch),
                Some(headers),
            ),
        )
        .await?;

        match rows.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map(Some)
                .map_err(|e| SchedulingError::Store(format!("failed to parse appointment: {}", e))),
            None => Ok(None),
        }
    }

    /// The CAS matched nothing: report why, from the caller's point of view
    /// a stale state rather than a generic failure.
    async fn classify_failed_transition(
        &self,
        appointment_id: Uuid,
        target: AppointmentStatus,
        auth_token: &str,
    ) -> SchedulingError {
        let current = match self.get_appointment(appointment_id, auth_token).await {
            Ok(appointment) => appointment,
            Err(err) => return err,
        };

        match lifecycle::validate_transition(current.status, target) {
            Err(err) => err,
            // Row is scheduled again only under an interleaving we cannot
            // observe from here; let the caller retry.
            Ok(()) => SchedulingError::Transient(
                "appointment state changed concurrently, retry".to_string(),
            ),
        }
    }
}
