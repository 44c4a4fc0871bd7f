use axum::routing::get;
use axum::Router;

use crate::handlers::notices;
use crate::state::AppState;

/// Notice board routes, merged at the `/api/v1` root.
///
/// ```text
/// GET /notices        -> list_notices
/// GET /notices/live   -> live_notices (WebSocket upgrade)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notices", get(notices::list_notices))
        .route("/notices/live", get(notices::live_notices))
}
