//! The security chain: an explicit, ordered list of stages run for every
//! inbound request before any business handler.
//!
//! Order (see [`SecurityChain::standard`]):
//!
//! 1. `authorization`: binds a principal from a bearer token, or rejects.
//! 2. `authentication`: serves the login path; issues tokens.
//! 3. `access`: requires a principal unless the request is public.
//!
//! Every stage either lets the request continue or halts it with a [`Reply`];
//! the first halt wins and later stages never run.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::stages::{AccessStage, AuthenticationStage, AuthorizationStage};
use crate::{IdentityProvider, IssuedToken, RequestContext, SecurityConfig, TokenCodec};

/// Request method, as far as the security layer cares.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Other,
}

impl Method {
    pub fn parse(method: &str) -> Self {
        match method {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            _ => Method::Other,
        }
    }
}

/// Login form submitted to the authentication stage.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Transport-agnostic view of an inbound request.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    /// Raw `Authorization` header value, if any.
    pub authorization: Option<String>,
    /// Parsed login form; only filled in for the login path.
    pub credentials: Option<Credentials>,
    /// Clock reading for every time-based decision on this request.
    pub received_at: DateTime<Utc>,
}

impl InboundRequest {
    pub fn new(method: Method, path: impl Into<String>, received_at: DateTime<Utc>) -> Self {
        Self {
            method,
            path: path.into(),
            authorization: None,
            credentials: None,
            received_at,
        }
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

/// Terminal response produced by a stage that halts the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Login succeeded.
    TokenIssued(IssuedToken),
    /// Missing, invalid or unresolvable token on a request that needs one.
    Unauthorized,
    /// Login failed. Carries no detail on purpose.
    AuthenticationFailed,
}

impl Reply {
    /// Short label for logs; never includes token material.
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::TokenIssued(_) => "token_issued",
            Reply::Unauthorized => "unauthorized",
            Reply::AuthenticationFailed => "authentication_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Continue,
    Halt(Reply),
}

/// One step of the security chain.
#[async_trait]
pub trait SecurityStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn apply(&self, request: &InboundRequest, context: &mut RequestContext) -> StageOutcome;
}

/// Result of running the whole chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Hand the request to the business handler with this context.
    Proceed(RequestContext),
    /// Answer immediately; the handler must not run.
    Halted(Reply),
}

/// Ordered security stages.
#[derive(Clone)]
pub struct SecurityChain {
    stages: Vec<Arc<dyn SecurityStage>>,
    config: Arc<SecurityConfig>,
}

impl SecurityChain {
    pub fn new(stages: Vec<Arc<dyn SecurityStage>>, config: SecurityConfig) -> Self {
        Self {
            stages,
            config: Arc::new(config),
        }
    }

    /// The production chain: authorization → authentication → access.
    pub fn standard(
        codec: Arc<dyn TokenCodec>,
        identities: Arc<dyn IdentityProvider>,
        config: SecurityConfig,
    ) -> Self {
        let stages: Vec<Arc<dyn SecurityStage>> = vec![
            Arc::new(AuthorizationStage::new(
                codec.clone(),
                identities.clone(),
                config.refresh_path.clone(),
            )),
            Arc::new(
                AuthenticationStage::new(codec, identities, config.login_path.clone())
                    .with_password_cost(config.password_cost),
            ),
            // The refresh endpoint authenticates the request itself.
            Arc::new(AccessStage::new(
                config.access.clone().permit_path(config.refresh_path.clone()),
            )),
        ];
        Self::new(stages, config)
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Whether the request body must be parsed into [`Credentials`].
    pub fn is_login(&self, method: Method, path: &str) -> bool {
        method == Method::Post && path == self.config.login_path
    }

    /// Run every stage in order against a fresh context.
    pub async fn run(&self, request: &InboundRequest) -> ChainOutcome {
        let mut context = RequestContext::new();

        for stage in &self.stages {
            match stage.apply(request, &mut context).await {
                StageOutcome::Continue => {}
                StageOutcome::Halt(reply) => {
                    tracing::debug!(
                        stage = stage.name(),
                        reply = reply.kind(),
                        "security chain halted"
                    );
                    return ChainOutcome::Halted(reply);
                }
            }
        }

        ChainOutcome::Proceed(context)
    }
}

impl core::fmt::Debug for SecurityChain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SecurityChain")
            .field("stages", &self.stage_names())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::{
        Hs256TokenCodec, Identity, IdentityError, JwtClaims, Role, TokenError, ValidatedToken,
        hash_password,
    };

    struct MapIdentities(HashMap<String, Identity>);

    #[async_trait]
    impl IdentityProvider for MapIdentities {
        async fn load_by_username(&self, username: &str) -> Result<Identity, IdentityError> {
            self.0.get(username).cloned().ok_or(IdentityError::NotFound)
        }
    }

    /// Codec wrapper counting `validate` calls.
    struct CountingCodec {
        inner: Hs256TokenCodec,
        validations: AtomicUsize,
    }

    impl TokenCodec for CountingCodec {
        fn issue(
            &self,
            subject: &str,
            authorities: &BTreeSet<Role>,
            now: DateTime<Utc>,
        ) -> Result<IssuedToken, TokenError> {
            self.inner.issue(subject, authorities, now)
        }

        fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<ValidatedToken, TokenError> {
            self.validations.fetch_add(1, Ordering::SeqCst);
            self.inner.validate(token, now)
        }

        fn verify_signature(&self, token: &str) -> Result<JwtClaims, TokenError> {
            self.inner.verify_signature(token)
        }
    }

    struct Fixture {
        chain: SecurityChain,
        codec: Arc<CountingCodec>,
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    async fn fixture() -> Fixture {
        let hash = hash_password("password123", 4).await.unwrap();
        let identities = MapIdentities(
            ["alice", "bob"]
                .into_iter()
                .map(|name| {
                    let identity = Identity::new(name, hash.clone(), BTreeSet::from([Role::USER]));
                    (name.to_string(), identity)
                })
                .collect(),
        );
        let codec = Arc::new(CountingCodec {
            inner: Hs256TokenCodec::new("chain-secret", Duration::minutes(30)),
            validations: AtomicUsize::new(0),
        });
        let config = SecurityConfig {
            password_cost: 4,
            ..SecurityConfig::default()
        };
        let chain = SecurityChain::standard(codec.clone(), Arc::new(identities), config);
        Fixture { chain, codec }
    }

    fn login(username: &str, password: &str) -> InboundRequest {
        InboundRequest::new(Method::Post, "/api/user/login", t0())
            .with_credentials(Credentials::new(username, password))
    }

    async fn login_token(chain: &SecurityChain) -> IssuedToken {
        login_token_for(chain, "alice").await
    }

    async fn login_token_for(chain: &SecurityChain, username: &str) -> IssuedToken {
        match chain.run(&login(username, "password123")).await {
            ChainOutcome::Halted(Reply::TokenIssued(token)) => token,
            other => panic!("expected issued token, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn declares_stage_order() {
        let f = fixture().await;
        assert_eq!(
            f.chain.stage_names(),
            vec!["authorization", "authentication", "access"]
        );
    }

    #[tokio::test]
    async fn login_issues_a_valid_token_for_alice() {
        let f = fixture().await;
        let token = login_token(&f.chain).await;

        assert!(!token.as_str().is_empty());
        let validated = f.codec.validate(token.as_str(), t0()).unwrap();
        assert_eq!(f.codec.extract_claims(&validated).subject(), "alice");
    }

    #[tokio::test]
    async fn bound_principal_reaches_handler() {
        let f = fixture().await;
        let token = login_token(&f.chain).await;

        let req = InboundRequest::new(Method::Post, "/api/schedules/5/comments", t0())
            .with_authorization(token.bearer());
        match f.chain.run(&req).await {
            ChainOutcome::Proceed(ctx) => {
                assert_eq!(ctx.require().unwrap().username(), "alice");
            }
            other => panic!("expected proceed, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn interleaved_requests_keep_their_own_principal() {
        let f = fixture().await;
        let alice = login_token_for(&f.chain, "alice").await;
        let bob = login_token_for(&f.chain, "bob").await;

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..60 {
            let chain = f.chain.clone();
            let caller = match i % 3 {
                0 => Some(("alice", alice.bearer())),
                1 => Some(("bob", bob.bearer())),
                _ => None,
            };
            tasks.spawn(async move {
                // Anonymous callers hit a public read; signed-in ones a protected write.
                let req = match &caller {
                    Some((_, bearer)) => {
                        InboundRequest::new(Method::Post, "/api/schedules", t0())
                            .with_authorization(bearer.clone())
                    }
                    None => InboundRequest::new(Method::Get, "/api/schedules", t0()),
                };
                tokio::task::yield_now().await;
                (caller.map(|(name, _)| name), chain.run(&req).await)
            });
        }

        let mut seen = 0;
        while let Some(joined) = tasks.join_next().await {
            let (expected, outcome) = joined.unwrap();
            match (expected, outcome) {
                (Some(name), ChainOutcome::Proceed(ctx)) => {
                    assert_eq!(ctx.require().unwrap().username(), name);
                }
                (None, ChainOutcome::Proceed(ctx)) => assert!(ctx.get().is_none()),
                other => panic!("unexpected outcome {other:?}"),
            }
            seen += 1;
        }
        assert_eq!(seen, 60);
    }

    #[tokio::test]
    async fn public_get_without_token_proceeds_anonymously() {
        let f = fixture().await;
        let req = InboundRequest::new(Method::Get, "/api/schedules/5/comments", t0());

        assert_eq!(
            f.chain.run(&req).await,
            ChainOutcome::Proceed(RequestContext::new())
        );
    }

    #[tokio::test]
    async fn protected_post_without_token_is_unauthorized_downstream() {
        let f = fixture().await;
        let req = InboundRequest::new(Method::Post, "/api/schedules/5/comments", t0());

        assert_eq!(f.chain.run(&req).await, ChainOutcome::Halted(Reply::Unauthorized));
        assert_eq!(f.codec.validations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_path_skips_validation_of_garbage_token() {
        let f = fixture().await;
        let req = InboundRequest::new(Method::Post, "/api/refresh", t0())
            .with_authorization("Bearer not-even-a-jwt");

        assert_eq!(
            f.chain.run(&req).await,
            ChainOutcome::Proceed(RequestContext::new())
        );
        assert_eq!(f.codec.validations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_token_rejects_even_on_public_get() {
        let f = fixture().await;
        let token = login_token(&f.chain).await;

        let later = t0() + Duration::minutes(31);
        let req = InboundRequest::new(Method::Get, "/api/schedules", later)
            .with_authorization(token.bearer());

        assert_eq!(f.chain.run(&req).await, ChainOutcome::Halted(Reply::Unauthorized));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_identical() {
        let f = fixture().await;

        let wrong_password = f.chain.run(&login("alice", "password999")).await;
        let unknown_user = f.chain.run(&login("nobody", "password123")).await;

        assert_eq!(wrong_password, ChainOutcome::Halted(Reply::AuthenticationFailed));
        assert_eq!(wrong_password, unknown_user);
    }

    #[tokio::test]
    async fn login_ignores_any_presented_token_state() {
        let f = fixture().await;
        // Login is public and served by the authentication stage even when an
        // unrelated valid token is attached.
        let token = login_token(&f.chain).await;
        let req = login("alice", "password123").with_authorization(token.bearer());

        assert!(matches!(
            f.chain.run(&req).await,
            ChainOutcome::Halted(Reply::TokenIssued(_))
        ));
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("alice", "hunter22"));
        assert!(!rendered.contains("hunter22"));
    }
}
