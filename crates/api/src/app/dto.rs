use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use schedboard_auth::{IssuedToken, Principal};

// -------------------------
// Response envelope
// -------------------------

/// Uniform success body: `{status_code, message, data?}`.
#[derive(Debug, Serialize)]
pub struct ResponseMsg<T: Serialize> {
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ResponseMsg<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            data,
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::OK, message, Some(data))
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::CREATED, message, Some(data))
    }
}

impl ResponseMsg<()> {
    pub fn message_only(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, message, None)
    }
}

impl<T: Serialize> IntoResponse for ResponseMsg<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

impl core::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenView {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

impl From<&IssuedToken> for TokenView {
    fn from(issued: &IssuedToken) -> Self {
        Self {
            token: issued.as_str().to_string(),
            token_type: "Bearer",
            expires_at: issued.expires_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub username: String,
    pub roles: Vec<String>,
}

impl From<&Principal> for UserView {
    fn from(principal: &Principal) -> Self {
        Self {
            username: principal.username().to_string(),
            roles: principal.roles().iter().map(|r| r.as_str().to_string()).collect(),
        }
    }
}
