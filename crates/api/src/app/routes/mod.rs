use std::str::FromStr;

use axum::Router;
use axum::response::Response;
use axum::routing::{get, post};

use schedboard_auth::{Principal, RequestContext};
use schedboard_core::DomainError;

use crate::app::errors;

pub mod comments;
pub mod refresh;
pub mod schedules;
pub mod system;
pub mod users;

/// Router for every endpoint; the security middleware is layered on top by `build_app`.
pub fn router() -> Router {
    Router::new()
        .route("/", get(system::index))
        .route("/health", get(system::health))
        .route("/api/user/signup", post(users::signup))
        .route("/api/user/me", get(users::me))
        .route("/api/refresh", post(refresh::refresh))
        .nest("/api/schedules", schedules::router())
}

/// The bound principal, or the generic 401.
pub(crate) fn require_principal(ctx: &RequestContext) -> Result<&Principal, Response> {
    ctx.require().map_err(|_| errors::unauthorized())
}

pub(crate) fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}
