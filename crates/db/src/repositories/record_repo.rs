//! Repository for the `records` table.

use serde_json::Value;
use sqlx::PgPool;

use crate::models::record::RecordRow;

const COLUMNS: &str = "collection, id, fields, created_at, updated_at";

/// Provides document-style CRUD over the `records` table.
pub struct RecordRepo;

impl RecordRepo {
    /// Every record in a collection, oldest first.
    pub async fn list(pool: &PgPool, collection: &str) -> Result<Vec<RecordRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM records WHERE collection = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, RecordRow>(&query)
            .bind(collection)
            .fetch_all(pool)
            .await
    }

    /// Records whose top-level `field` equals `value`. Containment keeps the
    /// query on the GIN index over `fields`.
    pub async fn list_where(
        pool: &PgPool,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<RecordRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM records \
             WHERE collection = $1 AND fields @> jsonb_build_object($2::text, $3::jsonb) \
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, RecordRow>(&query)
            .bind(collection)
            .bind(field)
            .bind(value)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        collection: &str,
        id: &str,
    ) -> Result<Option<RecordRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM records WHERE collection = $1 AND id = $2");
        sqlx::query_as::<_, RecordRow>(&query)
            .bind(collection)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new document under a caller-generated identity.
    pub async fn create(
        pool: &PgPool,
        collection: &str,
        id: &str,
        fields: &Value,
    ) -> Result<RecordRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO records (collection, id, fields) \
             VALUES ($1, $2, $3::jsonb) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RecordRow>(&query)
            .bind(collection)
            .bind(id)
            .bind(fields)
            .fetch_one(pool)
            .await
    }

    /// Merge a JSON patch into the stored document using PostgreSQL `||`.
    /// Keys absent from the patch are left untouched.
    pub async fn merge_fields(
        pool: &PgPool,
        collection: &str,
        id: &str,
        patch: &Value,
    ) -> Result<Option<RecordRow>, sqlx::Error> {
        let query = format!(
            "UPDATE records SET fields = fields || $3::jsonb \
             WHERE collection = $1 AND id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RecordRow>(&query)
            .bind(collection)
            .bind(id)
            .bind(patch)
            .fetch_optional(pool)
            .await
    }

    /// Delete a document. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, collection: &str, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM records WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
