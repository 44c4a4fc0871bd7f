//! Record Store Client: the document-store seam.
//!
//! - [`RecordStore`] -- list/get/insert/update/delete/subscribe per collection.
//! - [`memory::InMemoryStore`] -- process-local implementation used by tests
//!   and local development.
//! - [`changes::ChangeBus`] -- change notifications backing `subscribe`.
//!
//! Implementations are stateless from the caller's point of view and are
//! shared across managers behind an `Arc`.

pub mod changes;
pub mod memory;

use std::cmp::Ordering;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collection::Collection;
use crate::error::CoreError;
use crate::record::Record;
use crate::types::{Fields, RecordId};

pub use changes::{ChangeBus, ChangeKind, CollectionChanged};
pub use memory::InMemoryStore;

/// Live sequence of ordered collection snapshots.
pub type RecordStream = Pin<Box<dyn Stream<Item = Vec<Record>> + Send>>;

/// Failures surfaced by a [`RecordStore`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Network or backend failure.
    #[error("Record store unreachable: {0}")]
    Unreachable(String),

    /// The addressed record no longer exists.
    #[error("{collection} record {id} not found")]
    NotFound { collection: Collection, id: RecordId },

    /// The backend returned a document that could not be decoded.
    #[error("Malformed document: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn not_found(collection: Collection, id: &str) -> Self {
        Self::NotFound {
            collection,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => CoreError::NotFound {
                entity: collection.entity(),
                id,
            },
            other => CoreError::Store(other),
        }
    }
}

/// Ordering direction for subscriptions and grid sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Apply the direction to an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// Document-oriented store client, one named collection per call.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record in the collection.
    async fn list_all(&self, collection: Collection) -> Result<Vec<Record>, StoreError>;

    /// Records whose `field` equals `value`.
    async fn list_where(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Record>, StoreError>;

    /// A single record, or `None` if the identity does not exist.
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Record>, StoreError>;

    /// Insert a new document and return its system-assigned identity.
    async fn insert(&self, collection: Collection, fields: Fields) -> Result<RecordId, StoreError>;

    /// Overwrite only the given fields; every other field is left untouched.
    async fn update_partial(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;

    /// Cheap reachability probe for health reporting.
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Live snapshots of the collection ordered by `order_by`: the current
    /// contents first, then a fresh snapshot after every change.
    async fn subscribe(
        &self,
        collection: Collection,
        order_by: &str,
        direction: SortDirection,
    ) -> Result<RecordStream, StoreError>;
}

/// Compare two optional JSON scalars for ordering.
///
/// Numbers compare numerically and order before strings, which compare
/// case-insensitively. Absent or null
/// values sort after everything else regardless of direction.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => scalar_text(a)
                    .to_lowercase()
                    .cmp(&scalar_text(b).to_lowercase()),
            };
            direction.apply(ord)
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Sort records in place by one field.
pub fn order_records(records: &mut [Record], field: &str, direction: SortDirection) {
    records.sort_by(|a, b| compare_values(a.get(field), b.get(field), direction));
}
