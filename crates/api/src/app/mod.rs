//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage, token codec and security chain wiring plus use cases
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: response envelope and request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, ServiceError};

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, ServiceError> {
    let services = Arc::new(services::build_services(config).await?);
    let security = middleware::SecurityState {
        chain: services.chain(),
    };
    tracing::info!(stages = ?security.chain.stage_names(), "security chain ready");

    Ok(routes::router()
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
                security,
                middleware::security_middleware,
            )),
        ))
}
