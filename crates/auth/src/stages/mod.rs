//! The stages of the security chain, in chain order.

pub mod access;
pub mod authentication;
pub mod authorization;

pub use access::AccessStage;
pub use authentication::AuthenticationStage;
pub use authorization::{AuthorizationStage, AuthorizationState, extract_bearer};
