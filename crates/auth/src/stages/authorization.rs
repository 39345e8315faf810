//! Authorization stage: bearer token → bound principal.
//!
//! Per-request state machine:
//!
//! ```text
//! bypass path ───────────────────────────────► Bypassed   (continue)
//! no / blank token ──────────────────────────► NoToken    (continue)
//! token ─► validate ─► resolve identity ─────► Bound      (continue)
//!            │               │
//!            └───────────────┴───────────────► Rejected   (halt: unauthorized)
//! ```
//!
//! The bypass check runs before the token is looked at and ends this stage;
//! later stages still run.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::chain::{InboundRequest, Reply, SecurityStage, StageOutcome};
use crate::codec::BEARER_PREFIX;
use crate::{AuthError, IdentityProvider, Principal, RequestContext, TokenCodec};

/// Terminal state of the authorization stage for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationState {
    /// The request targets the bypass path; no token was inspected.
    Bypassed,
    /// No usable token; the request continues anonymously.
    NoToken,
    /// A principal with this username was bound to the context.
    Bound(String),
    /// The token was present but unusable.
    Rejected(AuthError),
}

/// Extract the token from an `Authorization: Bearer <token>` value.
///
/// Missing header, another scheme, or a blank token all yield `None`.
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix(BEARER_PREFIX)?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

pub struct AuthorizationStage {
    codec: Arc<dyn TokenCodec>,
    identities: Arc<dyn IdentityProvider>,
    bypass_path: String,
}

impl AuthorizationStage {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        identities: Arc<dyn IdentityProvider>,
        bypass_path: impl Into<String>,
    ) -> Self {
        Self {
            codec,
            identities,
            bypass_path: bypass_path.into(),
        }
    }

    /// Drive the state machine for one request, binding into `context` on success.
    pub async fn evaluate(
        &self,
        request: &InboundRequest,
        context: &mut RequestContext,
    ) -> AuthorizationState {
        if request.path == self.bypass_path {
            return AuthorizationState::Bypassed;
        }

        let Some(token) = extract_bearer(request.authorization.as_deref()) else {
            return AuthorizationState::NoToken;
        };

        match self.bind(token, request.received_at, context).await {
            Ok(username) => AuthorizationState::Bound(username),
            Err(e) => {
                context.clear();
                AuthorizationState::Rejected(e)
            }
        }
    }

    async fn bind(
        &self,
        token: &str,
        now: DateTime<Utc>,
        context: &mut RequestContext,
    ) -> Result<String, AuthError> {
        let validated = self.codec.validate(token, now)?;
        let claims = self.codec.extract_claims(&validated);

        let identity = self.identities.load_by_username(claims.subject()).await?;
        let principal = Principal::from_identity(&identity);
        let username = principal.username().to_string();

        context.set(principal).map_err(|_| AuthError::Unauthorized)?;
        Ok(username)
    }
}

#[async_trait]
impl SecurityStage for AuthorizationStage {
    fn name(&self) -> &'static str {
        "authorization"
    }

    async fn apply(&self, request: &InboundRequest, context: &mut RequestContext) -> StageOutcome {
        match self.evaluate(request, context).await {
            AuthorizationState::Bypassed => {
                tracing::debug!(path = %request.path, "token validation bypassed");
                StageOutcome::Continue
            }
            AuthorizationState::NoToken => {
                tracing::debug!("no token presented");
                StageOutcome::Continue
            }
            AuthorizationState::Bound(username) => {
                tracing::debug!(%username, "principal bound");
                StageOutcome::Continue
            }
            AuthorizationState::Rejected(reason) => {
                tracing::warn!(%reason, "token rejected");
                StageOutcome::Halt(Reply::Unauthorized)
            }
        }
    }
}
