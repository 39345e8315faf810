//! Signed token issue/validation (HS256 JWT).

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::claims::validate_claims;
use crate::{JwtClaims, Role, TokenError};

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    token: String,
    claims: JwtClaims,
}

impl IssuedToken {
    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &JwtClaims {
        &self.claims
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.claims.exp
    }

    /// Value for the `Authorization` response header.
    pub fn bearer(&self) -> String {
        format!("{BEARER_PREFIX}{}", self.token)
    }
}

/// Proof that a token passed [`TokenCodec::validate`].
///
/// Claims can only be read through this type, so they are never looked at
/// for a token that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedToken {
    claims: JwtClaims,
}

impl ValidatedToken {
    pub fn claims(&self) -> &JwtClaims {
        &self.claims
    }

    pub fn into_claims(self) -> JwtClaims {
        self.claims
    }
}

/// Scheme prefix used on the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Token creation and verification.
///
/// `now` is always supplied by the caller so that expiry is decided against
/// the request's clock reading.
pub trait TokenCodec: Send + Sync {
    /// Sign a token for `subject` valid for the configured TTL from `now`.
    fn issue(
        &self,
        subject: &str,
        authorities: &BTreeSet<Role>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError>;

    /// Check encoding, signature and time window.
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<ValidatedToken, TokenError>;

    /// Check encoding and signature only; expiry is left to the caller.
    ///
    /// Used by the refresh flow, which accepts recently expired tokens.
    fn verify_signature(&self, token: &str) -> Result<JwtClaims, TokenError>;

    fn extract_claims(&self, validated: &ValidatedToken) -> JwtClaims {
        validated.claims().clone()
    }
}

/// HMAC-SHA256 codec keyed by the process secret.
#[derive(Clone)]
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl Hs256TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in `validate_claims` against the caller's clock.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn decode(&self, token: &str) -> Result<JwtClaims, TokenError> {
        decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::malformed(e.to_string()),
            })
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn issue(
        &self,
        subject: &str,
        authorities: &BTreeSet<Role>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        if subject.trim().is_empty() {
            return Err(TokenError::Encoding("empty subject".to_string()));
        }

        let iat = now.trunc_subsecs(0);
        let exp = iat
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Encoding("token lifetime overflows the clock".to_string()))?;
        let claims = JwtClaims {
            sub: subject.to_string(),
            auth: authorities.clone(),
            iat,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }

    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<ValidatedToken, TokenError> {
        let claims = self.decode(token)?;
        validate_claims(&claims, now)?;
        Ok(ValidatedToken { claims })
    }

    fn verify_signature(&self, token: &str) -> Result<JwtClaims, TokenError> {
        self.decode(token)
    }
}
