//! In-process change notifications backed by a `tokio::sync::broadcast` channel.
//!
//! Stores publish a [`CollectionChanged`] after every successful write;
//! [`snapshot_stream`] turns those notifications into the live snapshot
//! sequence returned by `RecordStore::subscribe`.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::{RecordStream, StoreError};
use crate::collection::Collection;
use crate::record::Record;
use crate::types::RecordId;

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// A successful write against one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionChanged {
    pub collection: Collection,
    pub record_id: RecordId,
    pub kind: ChangeKind,
}

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// Fan-out bus for [`CollectionChanged`] notifications.
pub struct ChangeBus {
    sender: broadcast::Sender<CollectionChanged>,
}

impl ChangeBus {
    /// When the buffer is full the oldest notifications are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, collection: Collection, record_id: &str, kind: ChangeKind) {
        // A send error only means nobody is subscribed.
        let _ = self.sender.send(CollectionChanged {
            collection,
            record_id: record_id.to_string(),
            kind,
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectionChanged> {
        self.sender.subscribe()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Build a live snapshot stream.
///
/// Yields `initial` first, then calls `fetch` after every change to
/// `collection` (or after the receiver lagged, since changes may have been
/// missed). Fetch failures are logged and the stream waits for the next
/// change. The stream ends when the bus is dropped.
pub fn snapshot_stream<F, Fut>(
    collection: Collection,
    initial: Vec<Record>,
    changes: broadcast::Receiver<CollectionChanged>,
    fetch: F,
) -> RecordStream
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Record>, StoreError>> + Send + 'static,
{
    let stream = futures::stream::unfold(
        (Some(initial), changes, fetch),
        move |(pending, mut changes, fetch)| async move {
            if let Some(snapshot) = pending {
                return Some((snapshot, (None, changes, fetch)));
            }
            loop {
                match changes.recv().await {
                    Ok(change) if change.collection != collection => continue,
                    Ok(_) | Err(RecvError::Lagged(_)) => match fetch().await {
                        Ok(snapshot) => return Some((snapshot, (None, changes, fetch))),
                        Err(e) => {
                            tracing::warn!(
                                collection = %collection,
                                error = %e,
                                "Live snapshot refresh failed",
                            );
                        }
                    },
                    Err(RecvError::Closed) => return None,
                }
            }
        },
    );
    Box::pin(stream)
}
