//! Token refresh for the bypass path.
//!
//! The refresh endpoint is exempt from the authorization stage, so it does
//! its own checks here: signature first, then a grace window on expiry, then
//! a fresh identity lookup so removed users cannot keep refreshing.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::stages::extract_bearer;
use crate::{AuthError, IdentityProvider, IssuedToken, TokenCodec, TokenError};

pub struct TokenRefresher {
    codec: Arc<dyn TokenCodec>,
    identities: Arc<dyn IdentityProvider>,
    grace: Duration,
}

impl TokenRefresher {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        identities: Arc<dyn IdentityProvider>,
        grace: Duration,
    ) -> Self {
        Self {
            codec,
            identities,
            grace,
        }
    }

    /// Exchange the bearer token in `authorization` for a new one.
    pub async fn refresh(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let token = extract_bearer(authorization).ok_or(AuthError::Unauthorized)?;
        let claims = self.codec.verify_signature(token)?;

        if now < claims.iat {
            return Err(TokenError::malformed("issued_at is in the future").into());
        }
        // A deadline past the end of the clock never arrives.
        let deadline = claims.exp.checked_add_signed(self.grace);
        if deadline.is_some_and(|deadline| now >= deadline) {
            return Err(TokenError::Expired.into());
        }

        let identity = self.identities.load_by_username(&claims.sub).await?;
        Ok(self.codec.issue(&identity.username, &identity.roles, now)?)
    }
}
