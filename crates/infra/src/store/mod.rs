//! Entity repositories.

pub mod in_memory;

pub use in_memory::InMemoryRepository;

use std::sync::Arc;

use thiserror::Error;

use schedboard_core::Entity;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A writer panicked while holding the lock.
    #[error("store lock poisoned")]
    Poisoned,

    #[error("record already exists")]
    Duplicate,

    #[error("record does not exist")]
    Missing,
}

/// Keyed storage for one entity type.
///
/// Listing order is ascending id order, which is also insertion order since
/// ids come from [`Repository::next_id`].
pub trait Repository: Send + Sync {
    type Entity: Entity;

    /// Reserve a fresh identifier.
    fn next_id(&self) -> <Self::Entity as Entity>::Id;

    fn insert(&self, value: Self::Entity) -> Result<(), StoreError>;

    fn get(&self, id: <Self::Entity as Entity>::Id) -> Result<Option<Self::Entity>, StoreError>;

    /// Overwrite an existing record.
    fn replace(&self, value: Self::Entity) -> Result<(), StoreError>;

    fn remove(&self, id: <Self::Entity as Entity>::Id) -> Result<Option<Self::Entity>, StoreError>;

    fn list(&self) -> Result<Vec<Self::Entity>, StoreError>;

    /// Drop every record for which `keep` returns false; returns how many were dropped.
    fn retain(&self, keep: &dyn Fn(&Self::Entity) -> bool) -> Result<usize, StoreError>;
}

impl<S> Repository for Arc<S>
where
    S: Repository + ?Sized,
{
    type Entity = S::Entity;

    fn next_id(&self) -> <Self::Entity as Entity>::Id {
        (**self).next_id()
    }

    fn insert(&self, value: Self::Entity) -> Result<(), StoreError> {
        (**self).insert(value)
    }

    fn get(&self, id: <Self::Entity as Entity>::Id) -> Result<Option<Self::Entity>, StoreError> {
        (**self).get(id)
    }

    fn replace(&self, value: Self::Entity) -> Result<(), StoreError> {
        (**self).replace(value)
    }

    fn remove(&self, id: <Self::Entity as Entity>::Id) -> Result<Option<Self::Entity>, StoreError> {
        (**self).remove(id)
    }

    fn list(&self) -> Result<Vec<Self::Entity>, StoreError> {
        (**self).list()
    }

    fn retain(&self, keep: &dyn Fn(&Self::Entity) -> bool) -> Result<usize, StoreError> {
        (**self).retain(keep)
    }
}
