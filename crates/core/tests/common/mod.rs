//! Shared test stores for manager integration tests.
//!
//! - [`SpyStore`] records every call before delegating to an in-memory store.
//! - [`FailingStore`] fails writes (and optionally reads) as unreachable.
//! - [`GatedStore`] parks writes until the test releases them, so the order
//!   in which concurrent store responses land can be chosen.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Semaphore};

use shelfwatch_core::collection::Collection;
use shelfwatch_core::record::{fields, Record};
use shelfwatch_core::store::{InMemoryStore, RecordStore, RecordStream, SortDirection, StoreError};
use shelfwatch_core::types::{Fields, RecordId};

/// Seed a store with three offenses; `o2` has no description or fine.
pub async fn seed_offenses(store: &InMemoryStore) {
    store
        .seed(
            Collection::OffenseList,
            "o1",
            fields([
                ("studentId", json!("S-100")),
                ("offenseType", json!("Noise")),
                ("description", json!("Loud call in reading room")),
                ("offenseDate", json!("2024-03-01")),
                ("fineAmount", json!(25)),
                ("status", json!("Pending")),
            ]),
        )
        .await;
    store
        .seed(
            Collection::OffenseList,
            "o2",
            fields([
                ("studentId", json!("S-200")),
                ("offenseType", json!("Late return")),
                ("offenseDate", json!("2024-03-04")),
                ("status", json!("Resolved")),
            ]),
        )
        .await;
    store
        .seed(
            Collection::OffenseList,
            "o3",
            fields([
                ("studentId", json!("S-100")),
                ("offenseType", json!("Food in stacks")),
                ("description", json!("")),
                ("offenseDate", json!("2024-04-11")),
                ("fineAmount", json!(10)),
                ("status", json!("Pending")),
            ]),
        )
        .await;
}

// ---------------------------------------------------------------------------
// SpyStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListAll(Collection),
    ListWhere(Collection, String, Value),
    Get(Collection, String),
    Insert(Collection),
    UpdatePartial(Collection, String, Fields),
    Delete(Collection, String),
    Subscribe(Collection),
}

#[derive(Default)]
pub struct SpyStore {
    pub inner: InMemoryStore,
    calls: Mutex<Vec<Call>>,
}

impl SpyStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that write to the store.
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::Insert(_) | Call::UpdatePartial(..) | Call::Delete(..)
                )
            })
            .collect()
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl RecordStore for SpyStore {
    async fn list_all(&self, collection: Collection) -> Result<Vec<Record>, StoreError> {
        self.record(Call::ListAll(collection));
        self.inner.list_all(collection).await
    }

    async fn list_where(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Record>, StoreError> {
        self.record(Call::ListWhere(collection, field.into(), value.clone()));
        self.inner.list_where(collection, field, value).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Record>, StoreError> {
        self.record(Call::Get(collection, id.into()));
        self.inner.get(collection, id).await
    }

    async fn insert(&self, collection: Collection, fields: Fields) -> Result<RecordId, StoreError> {
        self.record(Call::Insert(collection));
        self.inner.insert(collection, fields).await
    }

    async fn update_partial(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        self.record(Call::UpdatePartial(collection, id.into(), fields.clone()));
        self.inner.update_partial(collection, id, fields).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.record(Call::Delete(collection, id.into()));
        self.inner.delete(collection, id).await
    }

    async fn subscribe(
        &self,
        collection: Collection,
        order_by: &str,
        direction: SortDirection,
    ) -> Result<RecordStream, StoreError> {
        self.record(Call::Subscribe(collection));
        self.inner.subscribe(collection, order_by, direction).await
    }
}

// ---------------------------------------------------------------------------
// FailingStore
// ---------------------------------------------------------------------------

/// Writes always fail. Reads fail too unless built with [`FailingStore::writes_only`].
#[derive(Default)]
pub struct FailingStore {
    reads: Option<InMemoryStore>,
}

impl FailingStore {
    pub fn everything() -> Self {
        Self { reads: None }
    }

    pub fn writes_only(inner: InMemoryStore) -> Self {
        Self { reads: Some(inner) }
    }

    fn reads(&self) -> Result<&InMemoryStore, StoreError> {
        self.reads.as_ref().ok_or_else(unreachable)
    }
}

fn unreachable() -> StoreError {
    StoreError::Unreachable("connection refused".into())
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn list_all(&self, collection: Collection) -> Result<Vec<Record>, StoreError> {
        self.reads()?.list_all(collection).await
    }

    async fn list_where(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Record>, StoreError> {
        self.reads()?.list_where(collection, field, value).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Record>, StoreError> {
        self.reads()?.get(collection, id).await
    }

    async fn insert(&self, _: Collection, _: Fields) -> Result<RecordId, StoreError> {
        Err(unreachable())
    }

    async fn update_partial(&self, _: Collection, _: &str, _: Fields) -> Result<(), StoreError> {
        Err(unreachable())
    }

    async fn delete(&self, _: Collection, _: &str) -> Result<(), StoreError> {
        Err(unreachable())
    }

    async fn subscribe(
        &self,
        collection: Collection,
        order_by: &str,
        direction: SortDirection,
    ) -> Result<RecordStream, StoreError> {
        self.reads()?.subscribe(collection, order_by, direction).await
    }
}

// ---------------------------------------------------------------------------
// GatedStore
// ---------------------------------------------------------------------------

/// Which write reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Update,
    Delete,
}

/// Reads pass straight through; `update_partial` and `delete` announce
/// themselves on the arrivals channel and then wait for a permit on their
/// own gate before touching the inner store.
pub struct GatedStore {
    pub inner: InMemoryStore,
    update_gate: Arc<Semaphore>,
    delete_gate: Arc<Semaphore>,
    arrivals: mpsc::UnboundedSender<Gate>,
}

impl GatedStore {
    pub fn new(inner: InMemoryStore) -> (Self, mpsc::UnboundedReceiver<Gate>) {
        let (arrivals, rx) = mpsc::unbounded_channel();
        let store = Self {
            inner,
            update_gate: Arc::new(Semaphore::new(0)),
            delete_gate: Arc::new(Semaphore::new(0)),
            arrivals,
        };
        (store, rx)
    }

    pub fn release(&self, gate: Gate) {
        match gate {
            Gate::Update => self.update_gate.add_permits(1),
            Gate::Delete => self.delete_gate.add_permits(1),
        }
    }

    async fn pass(&self, gate: Gate) {
        let _ = self.arrivals.send(gate);
        let semaphore = match gate {
            Gate::Update => &self.update_gate,
            Gate::Delete => &self.delete_gate,
        };
        semaphore.acquire().await.unwrap().forget();
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn list_all(&self, collection: Collection) -> Result<Vec<Record>, StoreError> {
        self.inner.list_all(collection).await
    }

    async fn list_where(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Record>, StoreError> {
        self.inner.list_where(collection, field, value).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Record>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn insert(&self, collection: Collection, fields: Fields) -> Result<RecordId, StoreError> {
        self.inner.insert(collection, fields).await
    }

    async fn update_partial(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        self.pass(Gate::Update).await;
        self.inner.update_partial(collection, id, fields).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.pass(Gate::Delete).await;
        self.inner.delete(collection, id).await
    }

    async fn subscribe(
        &self,
        collection: Collection,
        order_by: &str,
        direction: SortDirection,
    ) -> Result<RecordStream, StoreError> {
        self.inner.subscribe(collection, order_by, direction).await
    }
}
