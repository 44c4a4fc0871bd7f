pub mod admin;
pub mod auth;
pub mod health;
pub mod notices;
pub mod student;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      sign in (public)
/// /auth/logout                                     sign out (requires auth)
/// /auth/session                                    current session (requires auth)
///
/// /admin/{collection}/rows                         grid page (admin only)
/// /admin/{collection}/export                       CSV download (admin only)
/// /admin/{collection}/records                      create (admin only)
/// /admin/{collection}/records/{id}                 get, partial update, delete
///
/// /me/{collection}/rows                            own records (student only)
///
/// /notices                                         notice board (requires auth)
/// /notices/live                                    WebSocket feed (?token=)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .nest("/me", student::router())
        .merge(notices::router())
}
