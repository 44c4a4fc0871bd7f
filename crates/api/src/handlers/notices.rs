//! Handlers for the notice board (`/notices`), readable by every signed-in
//! user. Admins manage notices through `/admin/notices`.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use shelfwatch_core::collection::Collection;
use shelfwatch_core::record::Record;
use shelfwatch_core::store::{order_records, SortDirection};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::ws;

/// Notices are always shown newest first.
const NOTICE_ORDER_FIELD: &str = "postedAt";

/// Query parameters for `GET /notices/live`.
///
/// Browsers cannot set headers on a WebSocket handshake, so the session token
/// travels in the query string instead.
#[derive(Debug, Deserialize)]
pub struct LiveParams {
    pub token: String,
}

/// GET /api/v1/notices
pub async fn list_notices(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Record>>>> {
    let mut notices = state.store.list_all(Collection::Notices).await?;
    order_records(&mut notices, NOTICE_ORDER_FIELD, SortDirection::Desc);
    Ok(Json(DataResponse { data: notices }))
}

/// GET /api/v1/notices/live?token=...
///
/// Upgrades to a WebSocket that receives the full ordered notice list on
/// connect and again after every change.
pub async fn live_notices(
    upgrade: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<LiveParams>,
) -> AppResult<Response> {
    let user = AuthUser::from_token(&params.token, &state).await?;
    let snapshots = state
        .store
        .subscribe(Collection::Notices, NOTICE_ORDER_FIELD, SortDirection::Desc)
        .await?;

    Ok(upgrade
        .on_upgrade(move |socket| ws::serve_feed(socket, snapshots, user.subject))
        .into_response())
}
