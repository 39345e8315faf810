use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use schedboard_core::{DomainResult, Entity, ScheduleId};

use crate::{bounded_text, ensure_modifiable};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_CONTENTS_LEN: usize = 2000;

/// Unvalidated schedule input (create or full update).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScheduleDraft {
    pub title: String,
    #[serde(default)]
    pub contents: String,
}

impl ScheduleDraft {
    pub fn new(title: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            contents: contents.into(),
        }
    }

    fn validated(&self) -> DomainResult<(String, String)> {
        let title = bounded_text("title", &self.title, 1, MAX_TITLE_LEN)?;
        let contents = bounded_text("contents", &self.contents, 0, MAX_CONTENTS_LEN)?;
        Ok((title, contents))
    }
}

/// A schedule entry owned by the user who created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    id: ScheduleId,
    title: String,
    contents: String,
    author: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn create(
        id: ScheduleId,
        draft: &ScheduleDraft,
        author: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let (title, contents) = draft.validated()?;
        Ok(Self {
            id,
            title,
            contents,
            author: author.into(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace title and contents. Author and creation time never change.
    pub fn update(&mut self, draft: &ScheduleDraft, now: DateTime<Utc>) -> DomainResult<()> {
        let (title, contents) = draft.validated()?;
        self.title = title;
        self.contents = contents;
        self.updated_at = now;
        Ok(())
    }

    pub fn ensure_modifiable_by(&self, actor: &str, actor_is_admin: bool) -> DomainResult<()> {
        ensure_modifiable("schedule", &self.author, actor, actor_is_admin)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn contents(&self) -> &str {
        &self.contents
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

impl Entity for Schedule {
    type Id = ScheduleId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
