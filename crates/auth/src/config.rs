use chrono::Duration;

use crate::{BCRYPT_COST, Method};

/// Default login path served by the authentication stage.
pub const LOGIN_PATH: &str = "/api/user/login";

/// Default refresh path exempted from token validation.
pub const REFRESH_PATH: &str = "/api/refresh";

/// Security settings shared by the chain and the refresh flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    pub login_path: String,
    pub refresh_path: String,
    /// Lifetime of issued access tokens.
    pub token_ttl: Duration,
    /// How long after expiry a token may still be exchanged on the refresh path.
    pub refresh_grace: Duration,
    /// bcrypt cost of stored hashes; failed logins for unknown users pay the same.
    pub password_cost: u32,
    pub access: AccessPolicy,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            login_path: LOGIN_PATH.to_string(),
            refresh_path: REFRESH_PATH.to_string(),
            token_ttl: Duration::minutes(60),
            refresh_grace: Duration::days(7),
            password_cost: BCRYPT_COST,
            access: AccessPolicy::default(),
        }
    }
}

/// Requests that may run without a bound principal.
///
/// Public requests still go through the authorization stage, so a token that
/// is present is still validated and bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    exact: Vec<String>,
    prefixes: Vec<String>,
    methods: Vec<Method>,
}

impl AccessPolicy {
    /// Nothing is public.
    pub fn deny_all() -> Self {
        Self {
            exact: Vec::new(),
            prefixes: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn permit_path(mut self, path: impl Into<String>) -> Self {
        self.exact.push(path.into());
        self
    }

    /// Permit `prefix` itself and everything below it (`/api/user/**`).
    pub fn permit_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefixes.push(prefix.trim_end_matches('/').to_string());
        self
    }

    pub fn permit_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    pub fn is_public(&self, method: Method, path: &str) -> bool {
        if self.methods.contains(&method) {
            return true;
        }
        if self.exact.iter().any(|p| p == path) {
            return true;
        }
        self.prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

impl Default for AccessPolicy {
    /// Static assets, the root, `/api/user/**` and every GET.
    fn default() -> Self {
        Self::deny_all()
            .permit_prefix("/css")
            .permit_prefix("/js")
            .permit_prefix("/images")
            .permit_prefix("/webjars")
            .permit_path("/favicon.ico")
            .permit_path("/")
            .permit_path("/health")
            .permit_prefix("/api/user")
            .permit_method(Method::Get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_public_class() {
        let policy = AccessPolicy::default();

        assert!(policy.is_public(Method::Get, "/api/schedules/5/comments"));
        assert!(policy.is_public(Method::Post, "/api/user/signup"));
        assert!(policy.is_public(Method::Post, "/api/user"));
        assert!(policy.is_public(Method::Delete, "/"));
        assert!(policy.is_public(Method::Get, "/css/site.css"));

        assert!(!policy.is_public(Method::Post, "/api/schedules/5/comments"));
        assert!(!policy.is_public(Method::Post, "/api/username"));
        assert!(!policy.is_public(Method::Delete, "/api/schedules/5"));
        assert!(!policy.is_public(Method::Post, "/api/refresh"));
    }

    #[test]
    fn deny_all_has_no_public_requests() {
        assert!(!AccessPolicy::deny_all().is_public(Method::Get, "/"));
    }
}
