// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::SupabaseClient;
use shared_models::error::AppError;

use crate::models::{BookAppointmentRequest, CancelAppointmentRequest};
use crate::services::availability::AvailabilityService;
use crate::services::booking::BookingService;
use crate::SchedulingState;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailabilityQueryParams {
    pub professional_id: Uuid,
    pub date: NaiveDate,
    /// Comma-separated service ids; preferred over `duration_minutes`.
    pub service_ids: Option<String>,
    pub duration_minutes: Option<i64>,
    pub step_minutes: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DayQueryParams {
    pub date: NaiveDate,
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(params): Query<AvailabilityQueryParams>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let service = AvailabilityService::new(
        Arc::new(SupabaseClient::new(&state.config)),
        &state.config,
    );

    let slots = match parse_service_ids(params.service_ids.as_deref())? {
        Some(service_ids) => {
            service
                .available_slots_for_services(
                    params.professional_id,
                    params.date,
                    &service_ids,
                    params.step_minutes,
                    token,
                )
                .await?
        }
        None => {
            let duration = params.duration_minutes.ok_or_else(|| {
                AppError::ValidationError(
                    "either service_ids or duration_minutes is required".to_string(),
                )
            })?;
            service
                .available_slots(
                    params.professional_id,
                    params.date,
                    duration,
                    params.step_minutes,
                    token,
                )
                .await?
        }
    };

    Ok(Json(json!({
        "professional_id": params.professional_id,
        "date": params.date,
        "slots": slots,
    })))
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state.config, Arc::clone(&state.notifier));
    let appointment = service.book_appointment(request, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state.config, Arc::clone(&state.notifier));
    let appointment = service.get_appointment(appointment_id, auth.token()).await?;

    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state.config, Arc::clone(&state.notifier));
    let appointment = service
        .cancel_appointment(appointment_id, request, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state.config, Arc::clone(&state.notifier));
    let appointment = service
        .complete_appointment(appointment_id, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

/// Day sheet for the staff dashboard.
#[axum::debug_handler]
pub async fn get_professional_day(
    State(state): State<Arc<SchedulingState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(professional_id): Path<Uuid>,
    Query(params): Query<DayQueryParams>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state.config, Arc::clone(&state.notifier));
    let appointments = service
        .appointments_for_day(professional_id, params.date, auth.token())
        .await?;

    Ok(Json(json!({
        "professional_id": professional_id,
        "date": params.date,
        "appointments": appointments,
    })))
}

fn parse_service_ids(raw: Option<&str>) -> Result<Option<Vec<Uuid>>, AppError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let ids = raw
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            Uuid::parse_str(part.trim()).map_err(|_| {
                AppError::ValidationError(format!("invalid service id: {}", part.trim()))
            })
        })
        .collect::<Result<Vec<Uuid>, AppError>>()?;

    if ids.is_empty() {
        return Ok(None);
    }
    Ok(Some(ids))
}
