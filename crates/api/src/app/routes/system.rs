use axum::Json;
use axum::http::StatusCode;
use serde_json::{Value, json};

/// Service descriptor.
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "login": "POST /api/user/login",
            "signup": "POST /api/user/signup",
            "refresh": "POST /api/refresh",
            "schedules": "/api/schedules",
            "comments": "/api/schedules/:schedule_id/comments",
        },
    }))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
