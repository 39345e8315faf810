use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use schedboard_auth::{AuthError, IssuedToken, Reply};
use schedboard_core::DomainError;
use schedboard_infra::StoreError;

use crate::app::dto::{ResponseMsg, TokenView};
use crate::app::services::ServiceError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Generic 401; security failures never say which check failed.
pub fn unauthorized() -> Response {
    json_error(
        StatusCode::UNAUTHORIZED,
        "unauthorized",
        "authentication required",
    )
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        e @ DomainError::NotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", e.to_string())
        }
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
    }
}

pub fn service_error_to_response(err: ServiceError) -> Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Store(StoreError::Missing) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "not found")
        }
        ServiceError::Store(StoreError::Duplicate) => {
            json_error(StatusCode::CONFLICT, "conflict", "record already exists")
        }
        ServiceError::Store(e) => {
            tracing::error!(error = %e, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "internal error")
        }
        ServiceError::Auth(e @ (AuthError::Hashing(_) | AuthError::Storage(_))) => {
            tracing::error!(error = %e, "auth backend failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
        ServiceError::Auth(e) => {
            tracing::warn!(error = %e, "auth failure in service call");
            unauthorized()
        }
    }
}

/// 200 with the bearer value in `Authorization` and the token in the body.
pub fn token_response(issued: &IssuedToken, message: &'static str) -> Response {
    let body = ResponseMsg::ok(message, TokenView::from(issued));
    let mut response = body.into_response();

    match HeaderValue::from_str(&issued.bearer()) {
        Ok(value) => {
            response.headers_mut().insert(header::AUTHORIZATION, value);
            response
        }
        Err(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "token_error",
            "token could not be encoded",
        ),
    }
}

/// Map a halting security-chain reply to the HTTP answer.
pub fn reply_to_response(reply: Reply) -> Response {
    match reply {
        Reply::TokenIssued(issued) => token_response(&issued, "login succeeded"),
        Reply::Unauthorized => unauthorized(),
        Reply::AuthenticationFailed => json_error(
            StatusCode::UNAUTHORIZED,
            "authentication_failed",
            "invalid username or password",
        ),
    }
}
