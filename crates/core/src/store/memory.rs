//! Process-local [`RecordStore`].
//!
//! Documents live in insertion order per collection behind a `tokio`
//! `RwLock`. Cloning the store is cheap and every clone sees the same data.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::changes::{snapshot_stream, ChangeBus, ChangeKind};
use super::{order_records, RecordStore, RecordStream, SortDirection, StoreError};
use crate::collection::Collection;
use crate::record::Record;
use crate::types::{Fields, RecordId};

#[derive(Default)]
struct Inner {
    docs: RwLock<HashMap<Collection, Vec<Record>>>,
    changes: ChangeBus,
}

/// In-memory document store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document under a caller-chosen identity, replacing any
    /// existing document with that identity. No change is published.
    pub async fn seed(&self, collection: Collection, id: &str, fields: Fields) {
        let mut docs = self.inner.docs.write().await;
        let list = docs.entry(collection).or_default();
        list.retain(|r| r.id != id);
        list.push(Record::new(id, fields));
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: Collection) -> usize {
        self.inner
            .docs
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn list_all(&self, collection: Collection) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .inner
            .docs
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_where(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Record>, StoreError> {
        let docs = self.inner.docs.read().await;
        Ok(docs
            .get(&collection)
            .map(|list| {
                list.iter()
                    .filter(|r| r.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Record>, StoreError> {
        let docs = self.inner.docs.read().await;
        Ok(docs
            .get(&collection)
            .and_then(|list| list.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn insert(&self, collection: Collection, fields: Fields) -> Result<RecordId, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.inner
            .docs
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(Record::new(id.clone(), fields));
        self.inner.changes.publish(collection, &id, ChangeKind::Inserted);
        Ok(id)
    }

    async fn update_partial(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        {
            let mut docs = self.inner.docs.write().await;
            let record = docs
                .get_mut(&collection)
                .and_then(|list| list.iter_mut().find(|r| r.id == id))
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            record.fields.extend(fields);
        }
        self.inner.changes.publish(collection, id, ChangeKind::Updated);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        {
            let mut docs = self.inner.docs.write().await;
            let list = docs
                .get_mut(&collection)
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            let before = list.len();
            list.retain(|r| r.id != id);
            if list.len() == before {
                return Err(StoreError::not_found(collection, id));
            }
        }
        self.inner.changes.publish(collection, id, ChangeKind::Deleted);
        Ok(())
    }

    async fn subscribe(
        &self,
        collection: Collection,
        order_by: &str,
        direction: SortDirection,
    ) -> Result<RecordStream, StoreError> {
        // Subscribe before the initial read so no change slips in between.
        let changes = self.inner.changes.subscribe();
        let mut initial = self.list_all(collection).await?;
        order_records(&mut initial, order_by, direction);

        let store = self.clone();
        let order_by = order_by.to_string();
        Ok(snapshot_stream(collection, initial, changes, move || {
            let store = store.clone();
            let order_by = order_by.clone();
            async move {
                let mut snapshot = store.list_all(collection).await?;
                order_records(&mut snapshot, &order_by, direction);
                Ok(snapshot)
            }
        }))
    }
}
