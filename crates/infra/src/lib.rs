//! Infrastructure layer: storage adapters behind the domain/auth seams.
//!
//! Everything here is in-memory and thread-safe; swapping in a database means
//! implementing [`Repository`] and [`UserStore`] again.

pub mod store;
pub mod users;

pub use store::{InMemoryRepository, Repository, StoreError};
pub use users::{InMemoryUserStore, UserStore};

use schedboard_schedules::{Comment, Schedule};

pub type ScheduleRepository = InMemoryRepository<Schedule>;
pub type CommentRepository = InMemoryRepository<Comment>;
