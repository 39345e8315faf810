//! `schedboard-schedules`: schedules and their comments.
//!
//! Pure domain rules (validation, ownership). Identity comes from the caller
//! as a plain username plus an admin flag; this crate knows nothing about
//! tokens or HTTP.

pub mod comment;
pub mod schedule;

pub use comment::{Comment, CommentDraft};
pub use schedule::{Schedule, ScheduleDraft};

use schedboard_core::{DomainError, DomainResult};

/// Owner-or-admin rule shared by schedules and comments.
pub(crate) fn ensure_modifiable(
    what: &'static str,
    author: &str,
    actor: &str,
    actor_is_admin: bool,
) -> DomainResult<()> {
    if author == actor || actor_is_admin {
        Ok(())
    } else {
        Err(DomainError::forbidden(format!("only the author may modify this {what}")))
    }
}

/// Trim and bound-check a text field.
pub(crate) fn bounded_text(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> DomainResult<String> {
    let value = value.trim();
    let len = value.chars().count();
    if len < min {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    if len > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}
