//! `schedboard-core`: shared domain building blocks.
//!
//! Pure types only: identifiers, the entity contract and the domain error model.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CommentId, ScheduleId};
