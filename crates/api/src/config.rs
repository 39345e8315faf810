//! Process configuration read from the environment.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use schedboard_auth::{BCRYPT_COST, SecurityConfig};

const DEV_SECRET: &str = "dev-secret";

/// Longest accepted token lifetime and refresh grace (one year).
const MAX_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub refresh_grace: Duration,
    pub bcrypt_cost: u32,
    pub bind_addr: SocketAddr,
    /// Account created at startup with the `admin` role, if configured.
    pub admin: Option<(String, String)>,
}

impl AppConfig {
    /// Defaults for everything except the signing secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::minutes(60),
            refresh_grace: Duration::minutes(10_080),
            bcrypt_cost: BCRYPT_COST,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            admin: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_SECRET.to_string()
            }
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let mut config = Self::new(jwt_secret);

        if let Some(minutes) = parse::<i64>(&lookup, "JWT_TTL_MINUTES")? {
            config.token_ttl = bounded_minutes("JWT_TTL_MINUTES", minutes, 1)?;
        }
        if let Some(minutes) = parse::<i64>(&lookup, "REFRESH_GRACE_MINUTES")? {
            config.refresh_grace = bounded_minutes("REFRESH_GRACE_MINUTES", minutes, 0)?;
        }
        if let Some(cost) = parse::<u32>(&lookup, "BCRYPT_COST")? {
            if !(4..=31).contains(&cost) {
                return Err(invalid("BCRYPT_COST", cost));
            }
            config.bcrypt_cost = cost;
        }
        if let Some(addr) = parse::<SocketAddr>(&lookup, "BIND_ADDR")? {
            config.bind_addr = addr;
        }

        config.admin = match (lookup("ADMIN_USERNAME"), lookup("ADMIN_PASSWORD")) {
            (Some(user), Some(password)) => Some((user, password)),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("ADMIN_USERNAME")),
        };

        Ok(config)
    }

    pub fn security(&self) -> SecurityConfig {
        SecurityConfig {
            token_ttl: self.token_ttl,
            refresh_grace: self.refresh_grace,
            password_cost: self.bcrypt_cost,
            ..SecurityConfig::default()
        }
    }
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("refresh_grace", &self.refresh_grace)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("bind_addr", &self.bind_addr)
            .field("admin", &self.admin.as_ref().map(|(user, _)| user))
            .finish()
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

/// Minutes in `min..=MAX_MINUTES`, as a duration.
fn bounded_minutes(key: &'static str, minutes: i64, min: i64) -> Result<Duration, ConfigError> {
    if !(min..=MAX_MINUTES).contains(&minutes) {
        return Err(invalid(key, minutes));
    }
    Duration::try_minutes(minutes).ok_or_else(|| invalid(key, minutes))
}

fn invalid(key: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}
