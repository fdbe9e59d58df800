// ── Generic reactive entity collection ──
//
// Concurrent storage keyed by pet id with push-based change
// notification via `watch` channels.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// A reactive collection for a single entity type, keyed by pet id.
///
/// Uses `DashMap` for O(1) concurrent lookups and a `watch` channel for
/// push-based change notification. Every mutation rebuilds the snapshot
/// subscribers receive; snapshots are ordered by pet id so consumers see
/// a stable listing.
pub(crate) struct EntityCollection<T: Send + Sync + 'static> {
    by_id: DashMap<i64, Arc<T>>,
    /// Full snapshot, rebuilt on mutation for cheap subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_id: DashMap::new(),
            snapshot,
        }
    }

    /// Insert or update an entity. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, id: i64, entity: T) -> bool {
        let is_new = self.by_id.insert(id, Arc::new(entity)).is_none();
        self.rebuild_snapshot();
        is_new
    }

    /// Replace the whole collection in one step.
    pub(crate) fn replace_all(&self, entities: impl IntoIterator<Item = (i64, T)>) {
        self.by_id.clear();
        for (id, entity) in entities {
            self.by_id.insert(id, Arc::new(entity));
        }
        self.rebuild_snapshot();
    }

    /// Remove an entity. Returns the removed entity if it existed.
    pub(crate) fn remove(&self, id: i64) -> Option<Arc<T>> {
        let removed = self.by_id.remove(&id).map(|(_, v)| v);
        if removed.is_some() {
            self.rebuild_snapshot();
        }
        removed
    }

    pub(crate) fn get(&self, id: i64) -> Option<Arc<T>> {
        self.by_id.get(&id).map(|r| Arc::clone(r.value()))
    }

    /// Current snapshot (cheap `Arc` clone), ordered by pet id.
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Collect all values into an id-ordered snapshot and broadcast.
    fn rebuild_snapshot(&self) {
        let mut entries: Vec<(i64, Arc<T>)> = self
            .by_id
            .iter()
            .map(|r| (*r.key(), Arc::clone(r.value())))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        let values: Vec<Arc<T>> = entries.into_iter().map(|(_, v)| v).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn upsert_returns_true_for_new_id() {
        let col: EntityCollection<String> = EntityCollection::new();
        assert!(col.upsert(1, "hello".into()));
        assert!(!col.upsert(1, "world".into()));
        assert_eq!(*col.get(1).unwrap(), "world");
    }

    #[test]
    fn snapshot_is_ordered_by_id() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert(9, "b".into());
        col.upsert(1, "a".into());

        let snap = col.snapshot();
        assert_eq!(*snap[0], "a");
        assert_eq!(*snap[1], "b");
    }

    #[test]
    fn replace_all_drops_absent_ids() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert(1, "a".into());
        col.upsert(2, "b".into());

        col.replace_all([(2, "b2".into()), (3, "c".into())]);
        assert!(col.get(1).is_none());
        assert_eq!(*col.get(2).unwrap(), "b2");
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn remove_updates_snapshot() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.upsert(1, "a".into());
        assert!(col.remove(1).is_some());
        assert!(col.remove(1).is_none());
        assert!(col.snapshot().is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_mutations() {
        let col: EntityCollection<String> = EntityCollection::new();
        let mut rx = col.subscribe();
        col.upsert(1, "a".into());

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
    }
}
