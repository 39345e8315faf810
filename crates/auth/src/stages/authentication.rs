//! Authentication stage: serves the login path and issues tokens.
//!
//! Login is not an authorized action, so this stage never touches the
//! request context. All failures collapse into `AuthenticationFailed`, and an
//! unknown username still costs one bcrypt verification.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

use crate::chain::{Credentials, InboundRequest, Method, Reply, SecurityStage, StageOutcome};
use crate::{
    AuthError, BCRYPT_COST, IdentityError, IdentityProvider, IssuedToken, RequestContext,
    TokenCodec, hash_password, verify_password,
};

const DUMMY_PASSWORD: &str = "unknown-user-placeholder";

pub struct AuthenticationStage {
    codec: Arc<dyn TokenCodec>,
    identities: Arc<dyn IdentityProvider>,
    login_path: String,
    password_cost: u32,
    dummy_hash: OnceCell<String>,
}

impl AuthenticationStage {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        identities: Arc<dyn IdentityProvider>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            codec,
            identities,
            login_path: login_path.into(),
            password_cost: BCRYPT_COST,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Cost used for the placeholder hash checked when the user does not exist.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    /// Check credentials and sign a token for the stored username.
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let identity = match self.identities.load_by_username(&credentials.username).await {
            Ok(identity) => identity,
            Err(IdentityError::NotFound) => {
                self.verify_placeholder(&credentials.password).await;
                return Err(AuthError::AuthenticationFailed);
            }
            Err(e) => return Err(e.into()),
        };

        if !verify_password(&credentials.password, &identity.password_hash).await? {
            return Err(AuthError::AuthenticationFailed);
        }

        Ok(self.codec.issue(&identity.username, &identity.roles, now)?)
    }

    /// Spend one bcrypt verification so unknown users answer as slowly as known ones.
    async fn verify_placeholder(&self, password: &str) {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| hash_password(DUMMY_PASSWORD, self.password_cost))
            .await;
        match hash {
            Ok(hash) => {
                let _ = verify_password(password, hash).await;
            }
            Err(e) => tracing::warn!(reason = %e, "placeholder hash unavailable"),
        }
    }

    fn intercepts(&self, request: &InboundRequest) -> bool {
        request.method == Method::Post && request.path == self.login_path
    }
}

#[async_trait]
impl SecurityStage for AuthenticationStage {
    fn name(&self) -> &'static str {
        "authentication"
    }

    async fn apply(&self, request: &InboundRequest, _context: &mut RequestContext) -> StageOutcome {
        if !self.intercepts(request) {
            return StageOutcome::Continue;
        }

        let Some(credentials) = request.credentials.as_ref() else {
            tracing::warn!("login request without a readable credentials body");
            return StageOutcome::Halt(Reply::AuthenticationFailed);
        };

        match self.authenticate(credentials, request.received_at).await {
            Ok(token) => {
                tracing::info!(
                    username = %credentials.username,
                    expires_at = %token.expires_at(),
                    "login succeeded"
                );
                StageOutcome::Halt(Reply::TokenIssued(token))
            }
            Err(e) => {
                tracing::warn!(username = %credentials.username, reason = %e, "login failed");
                StageOutcome::Halt(Reply::AuthenticationFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::{Hs256TokenCodec, Identity, Role, hash_password};

    struct MapIdentities(HashMap<String, Identity>);

    #[async_trait]
    impl IdentityProvider for MapIdentities {
        async fn load_by_username(&self, username: &str) -> Result<Identity, IdentityError> {
            self.0.get(username).cloned().ok_or(IdentityError::NotFound)
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 4, 4, 4, 4).unwrap()
    }

    async fn stage() -> (AuthenticationStage, Arc<Hs256TokenCodec>) {
        let hash = hash_password("password123", 4).await.unwrap();
        let identities = MapIdentities(HashMap::from([(
            "alice".to_string(),
            Identity::new("alice", hash, BTreeSet::from([Role::USER])),
        )]));
        let codec = Arc::new(Hs256TokenCodec::new("authn-secret", Duration::minutes(15)));
        let stage =
            AuthenticationStage::new(codec.clone(), Arc::new(identities), "/api/user/login")
                .with_password_cost(4);
        (stage, codec)
    }

    fn login(credentials: Option<Credentials>) -> InboundRequest {
        let req = InboundRequest::new(Method::Post, "/api/user/login", t0());
        match credentials {
            Some(c) => req.with_credentials(c),
            None => req,
        }
    }

    #[tokio::test]
    async fn correct_password_issues_token() {
        let (stage, codec) = stage().await;
        let token = stage
            .authenticate(&Credentials::new("alice", "password123"), t0())
            .await
            .unwrap();

        let validated = codec.validate(token.as_str(), t0()).unwrap();
        assert_eq!(validated.claims().subject(), "alice");
        assert_eq!(token.expires_at(), t0() + Duration::minutes(15));
    }

    #[tokio::test]
    async fn bad_credentials_share_one_error() {
        let (stage, _) = stage().await;

        let wrong = stage
            .authenticate(&Credentials::new("alice", "nope"), t0())
            .await
            .unwrap_err();
        let unknown = stage
            .authenticate(&Credentials::new("bob", "password123"), t0())
            .await
            .unwrap_err();

        assert_eq!(wrong, AuthError::AuthenticationFailed);
        assert_eq!(unknown, AuthError::AuthenticationFailed);
    }

    #[tokio::test]
    async fn unknown_user_still_pays_for_a_hash_check() {
        let (stage, _) = stage().await;
        assert!(stage.dummy_hash.get().is_none());

        let err = stage
            .authenticate(&Credentials::new("nobody", "password123"), t0())
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::AuthenticationFailed);
        let placeholder = stage.dummy_hash.get().unwrap();
        assert!(placeholder.starts_with("$2"));
        assert!(placeholder.contains("$04$"));
    }

    #[tokio::test]
    async fn missing_body_fails_login() {
        let (stage, _) = stage().await;
        let mut ctx = RequestContext::new();

        assert_eq!(
            stage.apply(&login(None), &mut ctx).await,
            StageOutcome::Halt(Reply::AuthenticationFailed)
        );
    }

    #[tokio::test]
    async fn does_not_touch_context() {
        let (stage, _) = stage().await;
        let mut ctx = RequestContext::new();

        let outcome = stage
            .apply(&login(Some(Credentials::new("alice", "password123"))), &mut ctx)
            .await;

        assert!(matches!(outcome, StageOutcome::Halt(Reply::TokenIssued(_))));
        assert!(ctx.get().is_none());
    }

    #[tokio::test]
    async fn other_requests_pass_through() {
        let (stage, _) = stage().await;
        let mut ctx = RequestContext::new();

        let get_login = InboundRequest::new(Method::Get, "/api/user/login", t0());
        let signup = InboundRequest::new(Method::Post, "/api/user/signup", t0());

        assert_eq!(stage.apply(&get_login, &mut ctx).await, StageOutcome::Continue);
        assert_eq!(stage.apply(&signup, &mut ctx).await, StageOutcome::Continue);
    }
}
