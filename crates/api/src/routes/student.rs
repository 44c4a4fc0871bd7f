//! Route definitions for the student-facing `/me` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::student;
use crate::state::AppState;

/// Routes mounted at `/me`.
///
/// ```text
/// GET /{collection}/rows  -> my_rows (student only, read-only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{collection}/rows", get(student::my_rows))
}
