//! Handlers for the student-facing `/me` resource.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use shelfwatch_core::manager::RecordManager;

use super::records::{grid_view, load_view, resolve_collection, GridView};
use crate::error::AppResult;
use crate::middleware::rbac::RequireStudent;
use crate::query::GridParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/me/{collection}/rows
///
/// The signed-in student's own records, read-only. Collections without a
/// student view are rejected with 403.
pub async fn my_rows(
    RequireStudent(student): RequireStudent,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<GridParams>,
) -> AppResult<Json<DataResponse<GridView>>> {
    let collection = resolve_collection(&slug)?;
    let manager = RecordManager::for_session(Arc::clone(&state.store), collection, &student.session())?;
    load_view(&manager, &params).await?;
    Ok(Json(DataResponse {
        data: grid_view(&manager).await,
    }))
}
