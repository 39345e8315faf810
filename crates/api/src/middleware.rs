//! Security middleware: runs the security chain in front of every route.
//!
//! Each request gets a fresh [`RequestContext`] from the chain; on success it
//! is inserted into the request extensions for handlers to read.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::extract::State;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use tracing::Instrument;
use uuid::Uuid;

use schedboard_auth::{ChainOutcome, Credentials, InboundRequest, Method, Reply, SecurityChain};

use crate::app::errors;

/// Upper bound on a login body.
const MAX_LOGIN_BODY: usize = 16 * 1024;

#[derive(Clone)]
pub struct SecurityState {
    pub chain: Arc<SecurityChain>,
}

pub async fn security_middleware(
    State(state): State<SecurityState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let span = tracing::info_span!(
        "request",
        request_id = %Uuid::now_v7(),
        method = %req.method(),
        path = %req.uri().path(),
    );

    run_chain(state, req, next).instrument(span).await
}

async fn run_chain(state: SecurityState, req: Request<Body>, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let method = Method::parse(parts.method.as_str());
    let path = parts.uri.path().to_string();

    let mut inbound = InboundRequest::new(method, path.as_str(), Utc::now());
    // A header that is not valid visible ASCII is treated as absent.
    if let Some(value) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        inbound = inbound.with_authorization(value);
    }

    let body = if state.chain.is_login(method, &path) {
        let bytes = match to_bytes(body, MAX_LOGIN_BODY).await {
            Ok(bytes) => bytes,
            Err(_) => return errors::reply_to_response(Reply::AuthenticationFailed),
        };
        if let Ok(credentials) = serde_json::from_slice::<Credentials>(&bytes) {
            inbound = inbound.with_credentials(credentials);
        }
        Body::from(bytes)
    } else {
        body
    };

    match state.chain.run(&inbound).await {
        ChainOutcome::Proceed(context) => {
            let mut req = Request::from_parts(parts, body);
            req.extensions_mut().insert(context);
            let response = next.run(req).await;
            tracing::debug!(status = response.status().as_u16(), "request completed");
            response
        }
        ChainOutcome::Halted(reply) => errors::reply_to_response(reply),
    }
}
