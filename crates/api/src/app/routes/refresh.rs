use std::sync::Arc;

use axum::extract::Extension;
use axum::http::{HeaderMap, header};
use axum::response::Response;
use chrono::Utc;

use crate::app::errors;
use crate::app::services::AppServices;

/// Exchange a current or recently expired token for a new one.
///
/// The security chain skips token validation here, so every check happens in
/// the refresher. All failures look the same to the client.
pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match services.refresh(authorization, Utc::now()).await {
        Ok(issued) => errors::token_response(&issued, "token refreshed"),
        Err(e) => {
            tracing::warn!(reason = %e, "token refresh refused");
            errors::unauthorized()
        }
    }
}
