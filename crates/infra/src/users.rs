//! User storage and the identity provider backed by it.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use schedboard_auth::{Identity, IdentityError, IdentityProvider};

use crate::StoreError;

/// Identity provider that can also take new sign-ups.
pub trait UserStore: IdentityProvider {
    /// Store a new identity; usernames are unique.
    fn register(&self, identity: Identity) -> Result<(), StoreError>;
}

/// In-memory user store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<String, Identity>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IdentityProvider for InMemoryUserStore {
    async fn load_by_username(&self, username: &str) -> Result<Identity, IdentityError> {
        let map = self
            .inner
            .read()
            .map_err(|_| IdentityError::Storage("user store lock poisoned".to_string()))?;
        map.get(username).cloned().ok_or(IdentityError::NotFound)
    }
}

impl UserStore for InMemoryUserStore {
    fn register(&self, identity: Identity) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if map.contains_key(&identity.username) {
            return Err(StoreError::Duplicate);
        }
        tracing::info!(username = %identity.username, "user registered");
        map.insert(identity.username.clone(), identity);
        Ok(())
    }
}
