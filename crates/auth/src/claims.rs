use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Role, TokenError};

/// JWT claims carried by every access token.
///
/// Timestamps are encoded as Unix seconds (`iat`/`exp`) so the token stays a
/// standard JWT; sub-second precision is dropped on issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the username the token was issued to.
    pub sub: String,

    /// Authorities granted at issue time (informational; the authoritative
    /// set is re-read from the identity provider on every request).
    #[serde(default)]
    pub auth: BTreeSet<Role>,

    /// Issued-at timestamp.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,
}

impl JwtClaims {
    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn authorities(&self) -> &BTreeSet<Role> {
        &self.auth
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.exp
    }
}

/// Deterministically validate the time window of decoded claims.
///
/// Signature verification happens before this in the codec; this only looks
/// at the claims against the supplied clock reading.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.sub.trim().is_empty() {
        return Err(TokenError::malformed("empty subject"));
    }
    if claims.exp <= claims.iat {
        return Err(TokenError::malformed("expires_at <= issued_at"));
    }
    if now < claims.iat {
        return Err(TokenError::malformed("issued_at is in the future"));
    }
    if now >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}
