//! [`RecordStore`] over Postgres.
//!
//! Writes go through [`RecordRepo`] and publish on an in-process
//! [`ChangeBus`], so `subscribe` sees every change made through this store
//! instance. Writes made by other processes are picked up on the next
//! snapshot refresh.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use shelfwatch_core::collection::Collection;
use shelfwatch_core::record::Record;
use shelfwatch_core::store::changes::snapshot_stream;
use shelfwatch_core::store::{
    order_records, ChangeBus, ChangeKind, RecordStore, RecordStream, SortDirection, StoreError,
};
use shelfwatch_core::types::{Fields, RecordId};

use crate::models::record::into_records;
use crate::repositories::RecordRepo;
use crate::DbPool;

/// Map a driver error onto the store's failure vocabulary.
pub fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Serialization(err.to_string())
        }
        other => StoreError::Unreachable(other.to_string()),
    }
}

/// Postgres-backed document store.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: DbPool,
    changes: Arc<ChangeBus>,
}

impl PgRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            changes: Arc::new(ChangeBus::default()),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list_all(&self, collection: Collection) -> Result<Vec<Record>, StoreError> {
        let rows = RecordRepo::list(&self.pool, collection.as_str())
            .await
            .map_err(store_error)?;
        into_records(rows)
    }

    async fn list_where(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Record>, StoreError> {
        let rows = RecordRepo::list_where(&self.pool, collection.as_str(), field, value)
            .await
            .map_err(store_error)?;
        into_records(rows)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Record>, StoreError> {
        RecordRepo::find_by_id(&self.pool, collection.as_str(), id)
            .await
            .map_err(store_error)?
            .map(|row| row.into_record())
            .transpose()
    }

    async fn insert(&self, collection: Collection, fields: Fields) -> Result<RecordId, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        RecordRepo::create(&self.pool, collection.as_str(), &id, &Value::Object(fields))
            .await
            .map_err(store_error)?;
        tracing::debug!(collection = %collection, record_id = %id, "Record inserted");
        self.changes.publish(collection, &id, ChangeKind::Inserted);
        Ok(id)
    }

    async fn update_partial(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        RecordRepo::merge_fields(&self.pool, collection.as_str(), id, &Value::Object(fields))
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        self.changes.publish(collection, id, ChangeKind::Updated);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let deleted = RecordRepo::delete(&self.pool, collection.as_str(), id)
            .await
            .map_err(store_error)?;
        if !deleted {
            return Err(StoreError::not_found(collection, id));
        }
        self.changes.publish(collection, id, ChangeKind::Deleted);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await.map_err(store_error)
    }

    async fn subscribe(
        &self,
        collection: Collection,
        order_by: &str,
        direction: SortDirection,
    ) -> Result<RecordStream, StoreError> {
        let changes = self.changes.subscribe();
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

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn pool_errors_are_unreachable() {
        assert_matches!(store_error(sqlx::Error::PoolTimedOut), StoreError::Unreachable(_));
        assert_matches!(store_error(sqlx::Error::PoolClosed), StoreError::Unreachable(_));
    }

    #[test]
    fn decode_errors_are_serialization() {
        let err = sqlx::Error::Decode("bad jsonb".into());
        assert_matches!(store_error(err), StoreError::Serialization(_));
    }
}
