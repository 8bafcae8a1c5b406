use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use scheduling_cell::{scheduling_routes, SchedulingState};

pub fn create_router(state: Arc<SchedulingState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/scheduling", scheduling_routes(state))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "scheduling-api",
    }))
}
