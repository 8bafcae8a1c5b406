use std::sync::Arc;

use axum::{body::Body, http::Request, Router};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use scheduling_cell::{scheduling_routes, SchedulingState};
use shared_config::{AppConfig, SchedulingConfig};

pub const TEST_TOKEN: &str = "test-token";

pub fn test_state(store_url: &str) -> Arc<SchedulingState> {
    Arc::new(SchedulingState::new(AppConfig {
        supabase_url: store_url.to_string(),
        supabase_anon_key: "test-anon-key".to_string(),
        scheduling: SchedulingConfig::default(),
    }))
}

pub fn test_app(state: Arc<SchedulingState>) -> Router {
    scheduling_routes(state)
}

/// A date comfortably inside the booking horizon and past the lead buffer.
pub fn booking_date() -> NaiveDate {
    (Utc::now() + Duration::days(7)).date_naive()
}

pub fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    date.and_hms_opt(hour, minute, 0).unwrap().and_utc()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ==============================================================================
// STORE ROW FIXTURES
// ==============================================================================

pub fn professional_row(id: Uuid) -> Value {
    json!({
        "id": id,
        "full_name": "Sam Rivera",
        "timezone": "UTC",
        "is_active": true
    })
}

pub fn service_row(id: Uuid, duration_minutes: i32) -> Value {
    json!({
        "id": id,
        "name": "Haircut",
        "duration_minutes": duration_minutes,
        "price_cents": 4500
    })
}

/// Weekday schedule row matching `date`'s weekday: 09:00-12:00 with a
/// 10:00-10:15 break.
pub fn morning_schedule_row(professional_id: Uuid, date: NaiveDate) -> Value {
    use chrono::Datelike;
    json!({
        "id": Uuid::new_v4(),
        "professional_id": professional_id,
        "weekday": date.weekday().num_days_from_sunday(),
        "opens_at": "09:00:00",
        "closes_at": "12:00:00",
        "break_start": "10:00:00",
        "break_end": "10:15:00"
    })
}

pub fn appointment_row(
    id: Uuid,
    professional_id: Uuid,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    status: &str,
) -> Value {
    json!({
        "id": id,
        "professional_id": professional_id,
        "client_name": "Dana Cole",
        "client_phone": "+15550100",
        "client_account_id": null,
        "service_ids": [Uuid::new_v4()],
        "starts_at": starts_at.to_rfc3339(),
        "ends_at": ends_at.to_rfc3339(),
        "status": status,
        "notes": null,
        "cancelled_by": null,
        "cancellation_reason": null,
        "created_at": Utc::now().to_rfc3339(),
        "updated_at": Utc::now().to_rfc3339()
    })
}
