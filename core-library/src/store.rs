//! Record store port
//!
//! The store is the single shared mutable resource of the core. All reads and
//! writes go through this narrow contract; mutation happens exclusively via
//! the draft-mutator [`RecordStore::update`], which fetches the current value,
//! applies a caller-supplied transform to a mutable draft, and writes it back
//! under the store's lock. The contract provides last-writer-wins semantics
//! per id; no cross-record transactions.
//!
//! The persistent backend is a host concern. [`InMemoryRecordStore`] is the
//! reference implementation, used by desktop shims and tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{LibraryError, Result};
use crate::models::{MediaId, MediaRecord};

/// Draft mutation applied to a stored record under the store's write lock.
pub type RecordMutation = Box<dyn FnOnce(&mut MediaRecord) + Send>;

/// Key-value store of media records, keyed by [`MediaId`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record by id.
    async fn get(&self, id: &MediaId) -> Result<Option<MediaRecord>>;

    /// Insert or replace a record. Last-writer-wins per id.
    async fn insert(&self, record: MediaRecord) -> Result<()>;

    /// Apply a mutation to a draft of the existing record and persist the
    /// result. Fails with [`LibraryError::NotFound`] when the id is absent;
    /// returns the record as written.
    async fn update(&self, id: &MediaId, mutate: RecordMutation) -> Result<MediaRecord>;

    /// Enumerate all records.
    async fn list(&self) -> Result<Vec<MediaRecord>>;

    /// Number of records in the store.
    async fn count(&self) -> Result<usize>;
}

/// In-memory record store over a `BTreeMap`, giving deterministic enumeration
/// order (by id).
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<BTreeMap<MediaId, MediaRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(&self, id: &MediaId) -> Result<Option<MediaRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn insert(&self, record: MediaRecord) -> Result<()> {
        debug!(id = %record.id, status = %record.status, "Inserting record");
        self.records
            .write()
            .await
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn update(&self, id: &MediaId, mutate: RecordMutation) -> Result<MediaRecord> {
        let mut records = self.records.write().await;
        let record = records.get_mut(id).ok_or_else(|| LibraryError::NotFound {
            id: id.to_string(),
        })?;
        mutate(record);
        debug!(id = %id, status = %record.status, "Updated record");
        Ok(record.clone())
    }

    async fn list(&self) -> Result<Vec<MediaRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaStatus;

    fn record(name: &str) -> MediaRecord {
        MediaRecord::new(name, format!("/dcim/{}", name), format!("file:///dcim/{}", name))
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryRecordStore::new();
        store.insert(record("IMG_1.jpg")).await.unwrap();

        let found = store.get(&MediaId::new("IMG_1")).await.unwrap().unwrap();
        assert_eq!(found.original_name, "IMG_1.jpg");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_replaces() {
        let store = InMemoryRecordStore::new();
        store.insert(record("IMG_1.jpg")).await.unwrap();

        let mut newer = record("IMG_1.jpg");
        newer.size = 42;
        store.insert(newer).await.unwrap();

        let found = store.get(&MediaId::new("IMG_1")).await.unwrap().unwrap();
        assert_eq!(found.size, 42);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_applies_draft_mutation() {
        let store = InMemoryRecordStore::new();
        store.insert(record("IMG_1.jpg")).await.unwrap();

        let updated = store
            .update(
                &MediaId::new("IMG_1"),
                Box::new(|r| {
                    r.status = MediaStatus::Pending;
                    r.pending_path = Some("/pending/IMG_1.jpg".to_string());
                }),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, MediaStatus::Pending);
        let stored = store.get(&MediaId::new("IMG_1")).await.unwrap().unwrap();
        assert_eq!(stored.pending_path.as_deref(), Some("/pending/IMG_1.jpg"));
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = InMemoryRecordStore::new();
        let err = store
            .update(&MediaId::new("ghost"), Box::new(|_| {}))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let store = InMemoryRecordStore::new();
        store.insert(record("IMG_2.jpg")).await.unwrap();
        store.insert(record("IMG_1.jpg")).await.unwrap();

        let ids: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id.to_string())
            .collect();
        assert_eq!(ids, vec!["IMG_1", "IMG_2"]);
    }
}
