use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;

use schedboard_auth::RequestContext;
use schedboard_core::ScheduleId;
use schedboard_schedules::ScheduleDraft;

use crate::app::dto::ResponseMsg;
use crate::app::errors;
use crate::app::routes::{comments, parse_id, require_principal};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_schedule).get(list_schedules))
        .route(
            "/:schedule_id",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
        .route(
            "/:schedule_id/comments",
            post(comments::create_comment).get(comments::list_comments),
        )
        .route(
            "/:schedule_id/comments/:comment_id",
            put(comments::update_comment).delete(comments::delete_comment),
        )
}

pub async fn create_schedule(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<ScheduleDraft>,
) -> Response {
    let principal = match require_principal(&ctx) {
        Ok(p) => p,
        Err(response) => return response,
    };

    match services.create_schedule(principal, &body, Utc::now()) {
        Ok(schedule) => ResponseMsg::created("schedule created", schedule).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_schedules(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.list_schedules() {
        Ok(items) => ResponseMsg::ok("schedules", items).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_schedule(
    Extension(services): Extension<Arc<AppServices>>,
    Path(schedule_id): Path<String>,
) -> Response {
    let id: ScheduleId = match parse_id(&schedule_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.get_schedule(id) {
        Ok(schedule) => ResponseMsg::ok("schedule", schedule).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_schedule(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(schedule_id): Path<String>,
    Json(body): Json<ScheduleDraft>,
) -> Response {
    let principal = match require_principal(&ctx) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let id: ScheduleId = match parse_id(&schedule_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.update_schedule(principal, id, &body, Utc::now()) {
        Ok(schedule) => ResponseMsg::ok("schedule updated", schedule).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_schedule(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(schedule_id): Path<String>,
) -> Response {
    let principal = match require_principal(&ctx) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let id: ScheduleId = match parse_id(&schedule_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.delete_schedule(principal, id) {
        Ok(()) => {
            ResponseMsg::<()>::message_only(StatusCode::OK, "schedule deleted").into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
