//! Identity records and the provider seam to user storage.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{IdentityError, Role};

/// A stored user identity (credentials + authorities).
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub password_hash: String,
    pub roles: BTreeSet<Role>,
}

impl Identity {
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        roles: BTreeSet<Role>,
    ) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            roles,
        }
    }
}

impl core::fmt::Debug for Identity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("roles", &self.roles)
            .finish()
    }
}

/// Resolves usernames to identities. The only contact point with user storage.
///
/// Implementations must be safe to call concurrently from many requests.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn load_by_username(&self, username: &str) -> Result<Identity, IdentityError>;
}

#[async_trait]
impl<P> IdentityProvider for Arc<P>
where
    P: IdentityProvider + ?Sized,
{
    async fn load_by_username(&self, username: &str) -> Result<Identity, IdentityError> {
        (**self).load_by_username(username).await
    }
}
