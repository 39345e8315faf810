//! Application services: storage wiring plus the use cases the routes call.
//!
//! Handlers pass in the principal they pulled from the request context; the
//! ownership rule itself lives on the domain types.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use schedboard_auth::{
    AuthError, Hs256TokenCodec, Identity, IssuedToken, Principal, Role, SecurityChain,
    TokenRefresher, hash_password,
};
use schedboard_core::{CommentId, DomainError, Entity, ScheduleId};
use schedboard_infra::{
    CommentRepository, InMemoryUserStore, Repository, ScheduleRepository, StoreError, UserStore,
};
use schedboard_schedules::{Comment, CommentDraft, Schedule, ScheduleDraft};

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub struct AppServices {
    users: Arc<InMemoryUserStore>,
    schedules: Arc<ScheduleRepository>,
    comments: Arc<CommentRepository>,
    refresher: TokenRefresher,
    chain: Arc<SecurityChain>,
    bcrypt_cost: u32,
}

/// Wire stores, codec, security chain and refresher from configuration.
pub async fn build_services(config: &AppConfig) -> ServiceResult<AppServices> {
    let security = config.security();
    let codec = Arc::new(Hs256TokenCodec::new(&config.jwt_secret, security.token_ttl));
    let users = Arc::new(InMemoryUserStore::new());

    let chain = Arc::new(SecurityChain::standard(
        codec.clone(),
        users.clone(),
        security.clone(),
    ));
    let refresher = TokenRefresher::new(codec, users.clone(), security.refresh_grace);

    let services = AppServices {
        users,
        schedules: Arc::new(ScheduleRepository::new()),
        comments: Arc::new(CommentRepository::new()),
        refresher,
        chain,
        bcrypt_cost: config.bcrypt_cost,
    };

    if let Some((username, password)) = &config.admin {
        services
            .register(username, password, BTreeSet::from([Role::USER, Role::ADMIN]))
            .await?;
        tracing::info!(%username, "admin account seeded");
    }

    Ok(services)
}

impl AppServices {
    pub fn chain(&self) -> Arc<SecurityChain> {
        self.chain.clone()
    }

    // -------------------------
    // Users
    // -------------------------

    /// Create a `user`-role account after checking the username/password shape.
    pub async fn signup(&self, username: &str, password: &str) -> ServiceResult<Principal> {
        validate_username(username)?;
        validate_password(password)?;
        self.register(username, password, BTreeSet::from([Role::USER]))
            .await
    }

    async fn register(
        &self,
        username: &str,
        password: &str,
        roles: BTreeSet<Role>,
    ) -> ServiceResult<Principal> {
        let hash = hash_password(password, self.bcrypt_cost).await?;
        let identity = Identity::new(username, hash, roles);
        let principal = Principal::from_identity(&identity);

        self.users.register(identity).map_err(|e| match e {
            StoreError::Duplicate => ServiceError::Domain(DomainError::conflict(format!(
                "username {username} is already taken"
            ))),
            other => other.into(),
        })?;

        Ok(principal)
    }

    pub async fn refresh(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        self.refresher.refresh(authorization, now).await
    }

    // -------------------------
    // Schedules
    // -------------------------

    pub fn create_schedule(
        &self,
        author: &Principal,
        draft: &ScheduleDraft,
        now: DateTime<Utc>,
    ) -> ServiceResult<Schedule> {
        let schedule = Schedule::create(self.schedules.next_id(), draft, author.username(), now)?;
        self.schedules.insert(schedule.clone())?;
        tracing::info!(
            schedule_id = %schedule.id(),
            author = author.username(),
            "schedule created"
        );
        Ok(schedule)
    }

    /// All schedules, newest first.
    pub fn list_schedules(&self) -> ServiceResult<Vec<Schedule>> {
        let mut schedules = self.schedules.list()?;
        schedules.reverse();
        Ok(schedules)
    }

    pub fn get_schedule(&self, id: ScheduleId) -> ServiceResult<Schedule> {
        self.schedules
            .get(id)?
            .ok_or_else(|| DomainError::not_found("schedule").into())
    }

    pub fn update_schedule(
        &self,
        actor: &Principal,
        id: ScheduleId,
        draft: &ScheduleDraft,
        now: DateTime<Utc>,
    ) -> ServiceResult<Schedule> {
        let mut schedule = self.get_schedule(id)?;
        schedule.ensure_modifiable_by(actor.username(), actor.is_admin())?;
        schedule.update(draft, now)?;
        self.schedules
            .replace(schedule.clone())
            .map_err(|e| missing_as(e, "schedule"))?;
        Ok(schedule)
    }

    /// Delete a schedule and every comment under it.
    pub fn delete_schedule(&self, actor: &Principal, id: ScheduleId) -> ServiceResult<()> {
        let schedule = self.get_schedule(id)?;
        schedule.ensure_modifiable_by(actor.username(), actor.is_admin())?;

        self.schedules.remove(id)?;
        let dropped = self.comments.retain(&|c: &Comment| c.schedule_id() != id)?;
        tracing::info!(schedule_id = %id, comments = dropped, "schedule deleted");
        Ok(())
    }

    // -------------------------
    // Comments
    // -------------------------

    pub fn create_comment(
        &self,
        author: &Principal,
        schedule_id: ScheduleId,
        draft: &CommentDraft,
        now: DateTime<Utc>,
    ) -> ServiceResult<Comment> {
        self.get_schedule(schedule_id)?;
        let comment = Comment::create(
            self.comments.next_id(),
            schedule_id,
            draft,
            author.username(),
            now,
        )?;
        self.comments.insert(comment.clone())?;

        // The schedule may have been deleted after the first lookup.
        if self.schedules.get(schedule_id)?.is_none() {
            self.comments.remove(comment.id())?;
            return Err(DomainError::not_found("schedule").into());
        }
        Ok(comment)
    }

    /// Comments of one schedule, oldest first.
    pub fn list_comments(&self, schedule_id: ScheduleId) -> ServiceResult<Vec<Comment>> {
        self.get_schedule(schedule_id)?;
        Ok(self
            .comments
            .list()?
            .into_iter()
            .filter(|c| c.schedule_id() == schedule_id)
            .collect())
    }

    fn comment_in(&self, schedule_id: ScheduleId, id: CommentId) -> ServiceResult<Comment> {
        let comment = self
            .comments
            .get(id)?
            .ok_or(DomainError::not_found("comment"))?;
        comment.ensure_belongs_to(schedule_id)?;
        Ok(comment)
    }

    pub fn update_comment(
        &self,
        actor: &Principal,
        schedule_id: ScheduleId,
        id: CommentId,
        draft: &CommentDraft,
        now: DateTime<Utc>,
    ) -> ServiceResult<Comment> {
        let mut comment = self.comment_in(schedule_id, id)?;
        comment.ensure_modifiable_by(actor.username(), actor.is_admin())?;
        comment.update(draft, now)?;
        self.comments
            .replace(comment.clone())
            .map_err(|e| missing_as(e, "comment"))?;
        Ok(comment)
    }

    pub fn delete_comment(
        &self,
        actor: &Principal,
        schedule_id: ScheduleId,
        id: CommentId,
    ) -> ServiceResult<()> {
        let comment = self.comment_in(schedule_id, id)?;
        comment.ensure_modifiable_by(actor.username(), actor.is_admin())?;
        self.comments.remove(id)?;
        Ok(())
    }
}

/// A record removed between read and write is reported as not found.
fn missing_as(err: StoreError, what: &'static str) -> ServiceError {
    match err {
        StoreError::Missing => DomainError::not_found(what).into(),
        other => other.into(),
    }
}

fn validate_username(username: &str) -> Result<(), DomainError> {
    let ok = (4..=10).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !ok {
        return Err(DomainError::validation(
            "username must be 4-10 lowercase letters or digits",
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), DomainError> {
    let ok = (8..=15).contains(&password.len())
        && password.chars().all(|c| c.is_ascii_alphanumeric());
    if !ok {
        return Err(DomainError::validation(
            "password must be 8-15 letters or digits",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    async fn services() -> AppServices {
        let mut config = AppConfig::new("svc-secret");
        config.bcrypt_cost = 4;
        config.admin = Some(("root".to_string(), "rootpass1".to_string()));
        build_services(&config).await.unwrap()
    }

    fn principal(name: &str) -> Principal {
        Principal::new(name, BTreeSet::from([Role::USER]))
    }

    fn admin() -> Principal {
        Principal::new("root", BTreeSet::from([Role::USER, Role::ADMIN]))
    }

    #[test]
    fn username_and_password_shapes() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a1b2").is_ok());
        for bad in ["abc", "Alice", "alice_01", "abcdefghijk", ""] {
            assert!(validate_username(bad).is_err(), "{bad}");
        }

        assert!(validate_password("Passw0rd").is_ok());
        for bad in ["short1", "has space1", "pässword1", "abcdefghijklmnop"] {
            assert!(validate_password(bad).is_err(), "{bad}");
        }
    }

    #[tokio::test]
    async fn signup_assigns_user_role_and_rejects_duplicates() {
        let svc = services().await;
        let alice = svc.signup("alice", "Passw0rd").await.unwrap();
        assert_eq!(alice.roles(), &BTreeSet::from([Role::USER]));

        let err = svc.signup("alice", "Other123").await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn schedules_list_newest_first() {
        let svc = services().await;
        let now = Utc::now();
        for title in ["first", "second", "third"] {
            svc.create_schedule(&principal("alice"), &ScheduleDraft::new(title, ""), now)
                .unwrap();
        }

        let titles: Vec<_> = svc
            .list_schedules()
            .unwrap()
            .into_iter()
            .map(|s| s.title().to_string())
            .collect();
        assert_eq!(titles, ["third", "second", "first"]);
    }

    #[tokio::test]
    async fn only_author_or_admin_may_change_a_schedule() {
        let svc = services().await;
        let now = Utc::now();
        let s = svc
            .create_schedule(&principal("alice"), &ScheduleDraft::new("mine", ""), now)
            .unwrap();
        let draft = ScheduleDraft::new("hijacked", "");

        let err = svc
            .update_schedule(&principal("bob"), s.id(), &draft, now)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Forbidden(_))));

        let updated = svc
            .update_schedule(&admin(), s.id(), &draft, now + Duration::seconds(1))
            .unwrap();
        assert_eq!(updated.title(), "hijacked");
        assert_eq!(updated.author(), "alice");
    }

    #[tokio::test]
    async fn deleting_a_schedule_removes_its_comments() {
        let svc = services().await;
        let now = Utc::now();
        let alice = principal("alice");
        let keep = svc
            .create_schedule(&alice, &ScheduleDraft::new("keep", ""), now)
            .unwrap();
        let gone = svc
            .create_schedule(&alice, &ScheduleDraft::new("gone", ""), now)
            .unwrap();
        svc.create_comment(&alice, keep.id(), &CommentDraft::new("stays"), now)
            .unwrap();
        let doomed = svc
            .create_comment(&alice, gone.id(), &CommentDraft::new("goes"), now)
            .unwrap();

        svc.delete_schedule(&alice, gone.id()).unwrap();

        assert!(matches!(
            svc.get_schedule(gone.id()),
            Err(ServiceError::Domain(DomainError::NotFound("schedule")))
        ));
        assert_eq!(svc.list_comments(keep.id()).unwrap().len(), 1);
        assert!(matches!(
            svc.delete_comment(&alice, gone.id(), doomed.id()),
            Err(ServiceError::Domain(DomainError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn comments_racing_a_schedule_delete_leave_no_orphans() {
        let svc = services().await;
        let alice = principal("alice");
        let now = Utc::now();

        for _ in 0..50 {
            let s = svc
                .create_schedule(&alice, &ScheduleDraft::new("racy", ""), now)
                .unwrap();

            std::thread::scope(|scope| {
                scope.spawn(|| {
                    for _ in 0..200 {
                        let draft = CommentDraft::new("hello");
                        if svc.create_comment(&alice, s.id(), &draft, now).is_err() {
                            break;
                        }
                    }
                });
                scope.spawn(|| svc.delete_schedule(&alice, s.id()).unwrap());
            });

            let orphans = svc
                .comments
                .list()
                .unwrap()
                .into_iter()
                .filter(|c| c.schedule_id() == s.id())
                .count();
            assert_eq!(orphans, 0);
        }
    }

    #[tokio::test]
    async fn comments_are_scoped_to_their_schedule() {
        let svc = services().await;
        let now = Utc::now();
        let alice = principal("alice");
        let a = svc
            .create_schedule(&alice, &ScheduleDraft::new("a", ""), now)
            .unwrap();
        let b = svc
            .create_schedule(&alice, &ScheduleDraft::new("b", ""), now)
            .unwrap();
        let c = svc
            .create_comment(&alice, a.id(), &CommentDraft::new("on a"), now)
            .unwrap();

        let err = svc
            .update_comment(&alice, b.id(), c.id(), &CommentDraft::new("moved"), now)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound("comment"))));

        let err = svc
            .create_comment(&alice, ScheduleId::new(999), &CommentDraft::new("x"), now)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound("schedule"))));
    }

    #[tokio::test]
    async fn comments_list_oldest_first() {
        let svc = services().await;
        let now = Utc::now();
        let alice = principal("alice");
        let s = svc
            .create_schedule(&alice, &ScheduleDraft::new("s", ""), now)
            .unwrap();
        for content in ["one", "two", "three"] {
            svc.create_comment(&alice, s.id(), &CommentDraft::new(content), now)
                .unwrap();
        }

        let contents: Vec<_> = svc
            .list_comments(s.id())
            .unwrap()
            .into_iter()
            .map(|c| c.content().to_string())
            .collect();
        assert_eq!(contents, ["one", "two", "three"]);
    }
}
