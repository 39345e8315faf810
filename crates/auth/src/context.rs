//! Per-request security context.
//!
//! A `RequestContext` is created fresh by the security chain for every
//! inbound request and travels with that request only (in the HTTP layer it
//! is stored in the request's extensions). Nothing here is global.

use crate::{AuthError, ContextError, Principal};

/// Holder of at most one authenticated principal for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    principal: Option<Principal>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the principal. Once bound it cannot be replaced.
    pub fn set(&mut self, principal: Principal) -> Result<(), ContextError> {
        if self.principal.is_some() {
            return Err(ContextError::AlreadyBound);
        }
        self.principal = Some(principal);
        Ok(())
    }

    pub fn get(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Accessor for handlers that need an identity.
    pub fn require(&self) -> Result<&Principal, AuthError> {
        self.get().ok_or(AuthError::Unauthorized)
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn clear(&mut self) {
        self.principal = None;
    }
}
