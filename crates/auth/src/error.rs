//! Security error taxonomy.
//!
//! These types are internal: the stages collapse all of them into a single
//! external "unauthorized" class before anything reaches a client.

use thiserror::Error;

/// Failure to issue or validate a token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token could not be parsed (bad encoding, bad JSON, missing claims,
    /// impossible time window).
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    /// Signing failed while issuing a token.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

impl TokenError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Failure of an identity lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity not found")]
    NotFound,

    /// The backing store failed (unavailable, poisoned lock, ...).
    #[error("identity store failure: {0}")]
    Storage(String),
}

/// Failure of an authentication or authorization decision.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Bad credentials. Deliberately does not say which part was wrong.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The token was valid but its subject no longer resolves.
    #[error("identity not found")]
    IdentityNotFound,

    /// No (valid) principal for a protected resource.
    #[error("unauthorized")]
    Unauthorized,

    #[error("identity store failure: {0}")]
    Storage(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl From<IdentityError> for AuthError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::NotFound => AuthError::IdentityNotFound,
            IdentityError::Storage(msg) => AuthError::Storage(msg),
        }
    }
}

/// Misuse of a request context.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("a principal is already bound to this request")]
    AlreadyBound,
}
