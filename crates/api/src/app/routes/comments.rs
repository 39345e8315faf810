//! Comments nested under `/api/schedules/:schedule_id/comments`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use schedboard_auth::RequestContext;
use schedboard_core::{CommentId, ScheduleId};
use schedboard_schedules::CommentDraft;

use crate::app::dto::ResponseMsg;
use crate::app::errors;
use crate::app::routes::{parse_id, require_principal};
use crate::app::services::AppServices;

fn parse_ids(schedule_id: &str, comment_id: &str) -> Result<(ScheduleId, CommentId), Response> {
    Ok((parse_id(schedule_id)?, parse_id(comment_id)?))
}

pub async fn create_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(schedule_id): Path<String>,
    Json(body): Json<CommentDraft>,
) -> Response {
    let principal = match require_principal(&ctx) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let schedule_id: ScheduleId = match parse_id(&schedule_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.create_comment(principal, schedule_id, &body, Utc::now()) {
        Ok(comment) => ResponseMsg::created("comment created", comment).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_comments(
    Extension(services): Extension<Arc<AppServices>>,
    Path(schedule_id): Path<String>,
) -> Response {
    let schedule_id: ScheduleId = match parse_id(&schedule_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.list_comments(schedule_id) {
        Ok(items) => ResponseMsg::ok("comments", items).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path((schedule_id, comment_id)): Path<(String, String)>,
    Json(body): Json<CommentDraft>,
) -> Response {
    let principal = match require_principal(&ctx) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let (schedule_id, comment_id) = match parse_ids(&schedule_id, &comment_id) {
        Ok(ids) => ids,
        Err(response) => return response,
    };

    match services.update_comment(principal, schedule_id, comment_id, &body, Utc::now()) {
        Ok(comment) => ResponseMsg::ok("comment updated", comment).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path((schedule_id, comment_id)): Path<(String, String)>,
) -> Response {
    let principal = match require_principal(&ctx) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let (schedule_id, comment_id) = match parse_ids(&schedule_id, &comment_id) {
        Ok(ids) => ids,
        Err(response) => return response,
    };

    match services.delete_comment(principal, schedule_id, comment_id) {
        Ok(()) => {
            ResponseMsg::<()>::message_only(StatusCode::OK, "comment deleted").into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
