use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use schedboard_core::{CommentId, DomainError, DomainResult, Entity, ScheduleId};

use crate::{bounded_text, ensure_modifiable};

pub const MAX_CONTENT_LEN: usize = 500;

/// Unvalidated comment input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommentDraft {
    pub content: String,
}

impl CommentDraft {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    fn validated(&self) -> DomainResult<String> {
        bounded_text("content", &self.content, 1, MAX_CONTENT_LEN)
    }
}

/// A comment attached to exactly one schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    id: CommentId,
    schedule_id: ScheduleId,
    content: String,
    author: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn create(
        id: CommentId,
        schedule_id: ScheduleId,
        draft: &CommentDraft,
        author: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            schedule_id,
            content: draft.validated()?,
            author: author.into(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update(&mut self, draft: &CommentDraft, now: DateTime<Utc>) -> DomainResult<()> {
        self.content = draft.validated()?;
        self.updated_at = now;
        Ok(())
    }

    /// A comment addressed under the wrong schedule does not exist there.
    pub fn ensure_belongs_to(&self, schedule_id: ScheduleId) -> DomainResult<()> {
        if self.schedule_id == schedule_id {
            Ok(())
        } else {
            Err(DomainError::not_found("comment"))
        }
    }

    pub fn ensure_modifiable_by(&self, actor: &str, actor_is_admin: bool) -> DomainResult<()> {
        ensure_modifiable("comment", &self.author, actor, actor_is_admin)
    }

    pub fn schedule_id(&self) -> ScheduleId {
        self.schedule_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Entity for Comment {
    type Id = CommentId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
