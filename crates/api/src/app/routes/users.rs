use std::sync::Arc;

use axum::Json;
use axum::extract::Extension;
use axum::response::{IntoResponse, Response};

use schedboard_auth::RequestContext;

use crate::app::dto::{ResponseMsg, SignupRequest, UserView};
use crate::app::errors;
use crate::app::routes::require_principal;
use crate::app::services::AppServices;

pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<SignupRequest>,
) -> Response {
    match services.signup(&body.username, &body.password).await {
        Ok(principal) => {
            ResponseMsg::created("signup succeeded", UserView::from(&principal)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

/// The caller's own identity.
pub async fn me(Extension(ctx): Extension<RequestContext>) -> Response {
    match require_principal(&ctx) {
        Ok(principal) => ResponseMsg::ok("current user", UserView::from(principal)).into_response(),
        Err(response) => response,
    }
}
