use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use schedboard_core::Entity;

use super::{Repository, StoreError};

/// In-memory repository for tests/dev (and the default runtime store).
#[derive(Debug)]
pub struct InMemoryRepository<V: Entity> {
    inner: RwLock<BTreeMap<V::Id, V>>,
    sequence: AtomicU64,
}

impl<V: Entity> InMemoryRepository<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
            sequence: AtomicU64::new(0),
        }
    }
}

impl<V: Entity> Default for InMemoryRepository<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Repository for InMemoryRepository<V>
where
    V: Entity + Clone + Send + Sync + 'static,
    V::Id: From<u64>,
{
    type Entity = V;

    fn next_id(&self) -> V::Id {
        V::Id::from(self.sequence.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn insert(&self, value: V) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if map.contains_key(&value.id()) {
            return Err(StoreError::Duplicate);
        }
        map.insert(value.id(), value);
        Ok(())
    }

    fn get(&self, id: V::Id) -> Result<Option<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(&id).cloned())
    }

    fn replace(&self, value: V) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        match map.get_mut(&value.id()) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(StoreError::Missing),
        }
    }

    fn remove(&self, id: V::Id) -> Result<Option<V>, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.remove(&id))
    }

    fn list(&self) -> Result<Vec<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.values().cloned().collect())
    }

    fn retain(&self, keep: &dyn Fn(&V) -> bool) -> Result<usize, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let before = map.len();
        map.retain(|_id, v| keep(v));
        Ok(before - map.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use schedboard_core::ScheduleId;
    use schedboard_schedules::{Schedule, ScheduleDraft};

    use super::*;

    fn schedule(repo: &InMemoryRepository<Schedule>, title: &str) -> Schedule {
        Schedule::create(repo.next_id(), &ScheduleDraft::new(title, ""), "alice", Utc::now())
            .unwrap()
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let repo = InMemoryRepository::<Schedule>::new();
        assert_eq!(repo.next_id(), ScheduleId::new(1));
        assert_eq!(repo.next_id(), ScheduleId::new(2));
    }

    #[test]
    fn insert_get_replace_remove() {
        let repo = InMemoryRepository::new();
        let mut s = schedule(&repo, "first");
        let id = s.id();

        repo.insert(s.clone()).unwrap();
        assert_eq!(repo.insert(s.clone()), Err(StoreError::Duplicate));
        assert_eq!(repo.get(id).unwrap().as_ref(), Some(&s));

        s.update(&ScheduleDraft::new("renamed", ""), Utc::now()).unwrap();
        repo.replace(s.clone()).unwrap();
        assert_eq!(repo.get(id).unwrap().unwrap().title(), "renamed");

        assert_eq!(repo.remove(id).unwrap(), Some(s.clone()));
        assert_eq!(repo.get(id).unwrap(), None);
        assert_eq!(repo.replace(s), Err(StoreError::Missing));
    }

    #[test]
    fn list_is_in_id_order_and_retain_counts() {
        let repo = InMemoryRepository::new();
        for title in ["a", "b", "c"] {
            let s = schedule(&repo, title);
            repo.insert(s).unwrap();
        }

        let titles: Vec<_> = repo.list().unwrap().iter().map(|s| s.title().to_string()).collect();
        assert_eq!(titles, ["a", "b", "c"]);

        let dropped = repo.retain(&|s: &Schedule| s.title() != "b").unwrap();
        assert_eq!(dropped, 1);
        assert_eq!(repo.list().unwrap().len(), 2);
    }

    #[test]
    fn concurrent_inserts_get_distinct_ids() {
        let repo = Arc::new(InMemoryRepository::<Schedule>::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let s = schedule(&repo, "x");
                        repo.insert(s).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(repo.list().unwrap().len(), 400);
    }
}
