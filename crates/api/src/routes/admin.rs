//! Route definitions for the admin collection surface.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::records;
use crate::state::AppState;

/// Routes mounted at `/admin`. Every handler requires the admin role.
///
/// ```text
/// GET    /{collection}/rows              -> list_rows
/// GET    /{collection}/export            -> export_csv
/// POST   /{collection}/records           -> create_record
/// GET    /{collection}/records/{id}      -> get_record
/// PATCH  /{collection}/records/{id}      -> update_record
/// DELETE /{collection}/records/{id}      -> delete_record
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{collection}/rows", get(records::list_rows))
        .route("/{collection}/export", get(records::export_csv))
        .route("/{collection}/records", post(records::create_record))
        .route(
            "/{collection}/records/{id}",
            get(records::get_record)
                .patch(records::update_record)
                .delete(records::delete_record),
        )
}
