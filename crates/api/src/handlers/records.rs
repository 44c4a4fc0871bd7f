//! Handlers for the admin `/admin/{collection}` resource: the record grid,
//! CSV export, and record CRUD.
//!
//! Grid listings and exports go through a [`RecordManager`] so sorting,
//! filtering, and projection behave exactly as they do on screen. Writes
//! address the store directly and report store failures to the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shelfwatch_core::collection::Collection;
use shelfwatch_core::csv_export::{default_columns, resolve_columns};
use shelfwatch_core::editor::EditBuffer;
use shelfwatch_core::error::CoreError;
use shelfwatch_core::grid::GridPage;
use shelfwatch_core::manager::{RecordManager, Reconciliation};
use shelfwatch_core::row::RowViewModel;
use shelfwatch_core::schema::{schema_for, Audience, ColumnDef, CollectionSchema, FieldDef};
use shelfwatch_core::store::{RecordStore, StoreError};
use shelfwatch_core::types::Fields;

use crate::auth::password::hash_password;
use crate::auth::PASSWORD_HASH_FIELD;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::GridParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for creating or updating a record.
///
/// `values` are keyed by column key (as shown in the grid), not by the
/// stored field name. `password` is only accepted for student accounts.
#[derive(Debug, Deserialize)]
pub struct RecordInput {
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    pub password: Option<String>,
}

/// One rendered grid page plus the column and editor layout to draw it with.
#[derive(Debug, Serialize)]
pub struct GridView {
    pub collection: &'static str,
    pub read_only: bool,
    pub columns: Vec<ColumnDef>,
    pub editor: Vec<FieldDef>,
    #[serde(flatten)]
    pub page: GridPage,
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn unknown_collection(slug: &str) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Collection",
        id: slug.to_string(),
    })
}

/// Resolve a URL slug to a managed collection.
pub(crate) fn resolve_collection(slug: &str) -> AppResult<Collection> {
    slug.parse::<Collection>()
        .ok()
        .filter(|c| c.is_managed())
        .ok_or_else(|| unknown_collection(slug))
}

/// Resolve a URL slug to the admin schema for its collection.
fn resolve_admin_schema(slug: &str) -> AppResult<CollectionSchema> {
    let collection = resolve_collection(slug)?;
    schema_for(collection, Audience::Admin).ok_or_else(|| unknown_collection(slug))
}

/// Load the manager's rows and apply the requested view.
///
/// A failed load is reported as 503 rather than rendered as an empty grid.
pub(crate) async fn load_view(
    manager: &RecordManager<dyn RecordStore>,
    params: &GridParams,
) -> AppResult<()> {
    let view = params.grid_query(manager.schema())?;
    match manager.load().await {
        Reconciliation::StoreFailed => Err(StoreError::Unreachable(format!(
            "Could not load {}",
            manager.schema().collection
        ))
        .into()),
        _ => {
            manager.set_view(view).await;
            Ok(())
        }
    }
}

pub(crate) async fn grid_view(manager: &RecordManager<dyn RecordStore>) -> GridView {
    let schema = manager.schema();
    GridView {
        collection: schema.collection.slug(),
        read_only: schema.read_only(),
        columns: schema.columns.clone(),
        editor: schema.editor.clone(),
        page: manager.current_page().await,
    }
}

fn with_password(
    mut fields: Fields,
    collection: Collection,
    password: Option<&str>,
) -> AppResult<Fields> {
    let Some(password) = password else {
        return Ok(fields);
    };
    if collection != Collection::Students {
        return Err(AppError::BadRequest(format!(
            "{} records do not carry a password",
            collection.entity()
        )));
    }
    if password.is_empty() {
        return Err(AppError::BadRequest("Password must not be empty".into()));
    }
    let hash = hash_password(password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    fields.insert(PASSWORD_HASH_FIELD.to_string(), Value::String(hash));
    Ok(fields)
}

async fn fetch_row(
    store: &dyn RecordStore,
    schema: &CollectionSchema,
    id: &str,
) -> AppResult<RowViewModel> {
    let record = store
        .get(schema.collection, id)
        .await?
        .ok_or_else(|| StoreError::not_found(schema.collection, id))?;
    Ok(RowViewModel::project(&record, schema))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/{collection}/rows
///
/// One page of the collection grid. Accepts `sort`, `direction`, `filter`,
/// and `page` query parameters.
pub async fn list_rows(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<GridParams>,
) -> AppResult<Json<DataResponse<GridView>>> {
    let schema = resolve_admin_schema(&slug)?;
    let manager = RecordManager::new(Arc::clone(&state.store), schema);
    load_view(&manager, &params).await?;
    Ok(Json(DataResponse {
        data: grid_view(&manager).await,
    }))
}

/// GET /api/v1/admin/{collection}/export
///
/// Download every row matching the current view as CSV, across all pages.
/// `columns` selects and orders the exported columns; it defaults to every
/// exportable column.
pub async fn export_csv(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<GridParams>,
) -> AppResult<Response> {
    let schema = resolve_admin_schema(&slug)?;
    let keys = params.column_keys().unwrap_or_else(|| {
        default_columns(&schema)
            .into_iter()
            .map(|c| c.key)
            .collect()
    });
    if resolve_columns(&schema, &keys).is_empty() {
        return Err(AppError::BadRequest(
            "No exportable columns selected".into(),
        ));
    }

    let manager = RecordManager::new(Arc::clone(&state.store), schema);
    load_view(&manager, &params).await?;
    let csv = manager.export_visible(&keys).await?;

    tracing::info!(collection = %slug, columns = keys.len(), "Exported grid as CSV");

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{slug}.csv\""),
            ),
        ],
        csv,
    )
        .into_response())
}

/// POST /api/v1/admin/{collection}/records
///
/// Insert a record from the add form. Returns the projected row.
pub async fn create_record(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<RecordInput>,
) -> AppResult<(StatusCode, Json<DataResponse<RowViewModel>>)> {
    let schema = resolve_admin_schema(&slug)?;
    let document = EditBuffer::from_values(input.values).to_document(&schema);
    if document.is_empty() {
        return Err(AppError::BadRequest(format!(
            "No {} fields supplied",
            schema.collection.entity()
        )));
    }
    let document = with_password(document, schema.collection, input.password.as_deref())?;

    let id = state.store.insert(schema.collection, document).await?;
    tracing::info!(
        collection = %schema.collection,
        record_id = %id,
        admin = %admin.subject,
        "Record created",
    );

    let row = fetch_row(state.store.as_ref(), &schema, &id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: row })))
}

/// GET /api/v1/admin/{collection}/records/{id}
pub async fn get_record(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<RowViewModel>>> {
    let schema = resolve_admin_schema(&slug)?;
    let row = fetch_row(state.store.as_ref(), &schema, &id).await?;
    Ok(Json(DataResponse { data: row }))
}

/// PATCH /api/v1/admin/{collection}/records/{id}
///
/// Partial update: only editor fields present in the body are written; every
/// other stored field is left untouched.
pub async fn update_record(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
    Json(input): Json<RecordInput>,
) -> AppResult<Json<DataResponse<RowViewModel>>> {
    let schema = resolve_admin_schema(&slug)?;
    let patch = EditBuffer::from_values(input.values).to_patch(&schema);
    let patch = with_password(patch, schema.collection, input.password.as_deref())?;
    if patch.is_empty() {
        return Err(AppError::BadRequest("No editable fields supplied".into()));
    }

    state
        .store
        .update_partial(schema.collection, &id, patch)
        .await?;
    tracing::info!(
        collection = %schema.collection,
        record_id = %id,
        admin = %admin.subject,
        "Record updated",
    );

    let row = fetch_row(state.store.as_ref(), &schema, &id).await?;
    Ok(Json(DataResponse { data: row }))
}

/// DELETE /api/v1/admin/{collection}/records/{id}
///
/// Deletes exactly one record. The confirmation step happens client-side.
pub async fn delete_record(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let collection = resolve_collection(&slug)?;
    state.store.delete(collection, &id).await?;
    tracing::info!(
        collection = %collection,
        record_id = %id,
        admin = %admin.subject,
        "Record deleted",
    );
    Ok(StatusCode::NO_CONTENT)
}
