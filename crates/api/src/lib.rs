//! HTTP API: server wiring, security middleware, routing, and response mapping.

pub mod app;
pub mod config;
pub mod middleware;

pub use config::{AppConfig, ConfigError};
