//! `schedboard-auth`: stateless JWT authentication/authorization.
//!
//! This crate is intentionally decoupled from HTTP and storage: the HTTP layer
//! translates requests into [`InboundRequest`]s and runs the [`SecurityChain`];
//! storage plugs in through [`IdentityProvider`].

pub mod chain;
pub mod claims;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod password;
pub mod principal;
pub mod refresh;
pub mod roles;
pub mod stages;

pub use chain::{
    ChainOutcome, Credentials, InboundRequest, Method, Reply, SecurityChain, SecurityStage,
    StageOutcome,
};
pub use claims::{JwtClaims, validate_claims};
pub use codec::{BEARER_PREFIX, Hs256TokenCodec, IssuedToken, TokenCodec, ValidatedToken};
pub use config::{AccessPolicy, LOGIN_PATH, REFRESH_PATH, SecurityConfig};
pub use context::RequestContext;
pub use error::{AuthError, ContextError, IdentityError, TokenError};
pub use identity::{Identity, IdentityProvider};
pub use password::{BCRYPT_COST, hash_password, verify_password};
pub use principal::Principal;
pub use refresh::TokenRefresher;
pub use roles::Role;
pub use stages::{AuthorizationState, extract_bearer};
