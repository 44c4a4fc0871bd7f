//! Stored document model.

use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

use shelfwatch_core::collection::Collection;
use shelfwatch_core::record::Record;
use shelfwatch_core::store::StoreError;
use shelfwatch_core::types::Timestamp;

/// A row from the `records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecordRow {
    pub collection: String,
    pub id: String,
    /// NOT NULL and always a JSON object (enforced by a check constraint).
    pub fields: Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RecordRow {
    /// Convert into the domain record, rejecting rows whose body is not an
    /// object or whose collection is unknown.
    pub fn into_record(self) -> Result<Record, StoreError> {
        if Collection::from_storage_name(&self.collection).is_none() {
            return Err(StoreError::Serialization(format!(
                "record {} belongs to unknown collection '{}'",
                self.id, self.collection
            )));
        }
        match self.fields {
            Value::Object(fields) => Ok(Record::new(self.id, fields)),
            other => Err(StoreError::Serialization(format!(
                "record {} has a non-object body: {other}",
                self.id
            ))),
        }
    }
}

/// Convert a batch of rows, failing on the first malformed one.
pub fn into_records(rows: Vec<RecordRow>) -> Result<Vec<Record>, StoreError> {
    rows.into_iter().map(RecordRow::into_record).collect()
}
