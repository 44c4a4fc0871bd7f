#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use shelfwatch_api::auth::jwt::{generate_session_token, JwtConfig};
use shelfwatch_api::auth::password::hash_password;
use shelfwatch_api::auth::PASSWORD_HASH_FIELD;
use shelfwatch_api::config::ServerConfig;
use shelfwatch_api::router::build_app_router;
use shelfwatch_api::state::AppState;
use shelfwatch_core::collection::Collection;
use shelfwatch_core::record::{fields, Record};
use shelfwatch_core::session::Role;
use shelfwatch_core::store::{InMemoryStore, RecordStore, RecordStream, SortDirection, StoreError};
use shelfwatch_core::types::{Fields, RecordId};

pub const ADMIN_EMAIL: &str = "librarian@uni.test";
pub const ADMIN_PASSWORD: &str = "stacks-and-stacks";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            session_idle_mins: 60,
        },
        bootstrap_admin: None,
    }
}

/// Build the full application router over the given store, with the same
/// middleware stack production uses.
pub fn build_test_app(store: impl RecordStore + 'static) -> Router {
    let config = test_config();
    let state = AppState::new(Arc::new(store), config.clone());
    build_app_router(state, &config)
}

/// Mint a session token directly, skipping the password check.
pub fn token_for(role: Role, subject: &str, name: &str) -> String {
    let (token, _) = generate_session_token(subject, role, name, &test_config().jwt)
        .expect("token generation should succeed");
    token
}

pub fn admin_token() -> String {
    token_for(Role::Admin, ADMIN_EMAIL, "Head Librarian")
}

pub fn student_token(student_id: &str) -> String {
    token_for(Role::Student, student_id, "Student")
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, empty_request("GET", uri, None)).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request("GET", uri, Some(token))).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send(app, json_request("POST", uri, None, &body)).await
}

pub async fn post_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request("POST", uri, Some(token))).await
}

pub async fn post_json_auth(app: &Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, json_request("POST", uri, Some(token), &body)).await
}

pub async fn patch_json_auth(app: &Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, json_request("PATCH", uri, Some(token), &body)).await
}

pub async fn delete_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request("DELETE", uri, Some(token))).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Sign in through the API and return the session token.
pub async fn login(app: &Router, id_or_email: &str, password: &str) -> String {
    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "id_or_email": id_or_email, "password": password }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["data"]["token"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

pub async fn seed_admin(store: &InMemoryStore) {
    let hash = hash_password(ADMIN_PASSWORD).unwrap();
    store
        .seed(
            Collection::Admins,
            "a1",
            fields([
                ("email", json!(ADMIN_EMAIL)),
                ("name", json!("Head Librarian")),
                (PASSWORD_HASH_FIELD, json!(hash)),
            ]),
        )
        .await;
}

pub async fn seed_student(store: &InMemoryStore, id: &str, student_id: &str, email: &str, password: &str) {
    let hash = hash_password(password).unwrap();
    store
        .seed(
            Collection::Students,
            id,
            fields([
                ("studentId", json!(student_id)),
                ("name", json!("Ada Lovelace")),
                ("email", json!(email)),
                ("status", json!("Active")),
                (PASSWORD_HASH_FIELD, json!(hash)),
            ]),
        )
        .await;
}

/// Three offenses: two for S-100, one for S-200.
pub async fn seed_offenses(store: &InMemoryStore) {
    store
        .seed(
            Collection::OffenseList,
            "o1",
            fields([
                ("studentId", json!("S-100")),
                ("offenseType", json!("Noise")),
                ("description", json!("Loud phone call")),
                ("offenseDate", json!("2024-03-01")),
                ("fineAmount", json!(25)),
                ("status", json!("Pending")),
            ]),
        )
        .await;
    store
        .seed(
            Collection::OffenseList,
            "o2",
            fields([
                ("studentId", json!("S-200")),
                ("offenseType", json!("Late return")),
                ("offenseDate", json!("2024-03-04")),
                ("status", json!("Resolved")),
            ]),
        )
        .await;
    store
        .seed(
            Collection::OffenseList,
            "o3",
            fields([
                ("studentId", json!("S-100")),
                ("offenseType", json!("Food in stacks")),
                ("description", json!("")),
                ("offenseDate", json!("2024-04-11")),
                ("fineAmount", json!(10)),
                ("status", json!("Pending")),
            ]),
        )
        .await;
}

// ---------------------------------------------------------------------------
// Unreachable store
// ---------------------------------------------------------------------------

/// A store whose backend is down: every call fails with `Unreachable`.
pub struct DownStore;

fn down() -> StoreError {
    StoreError::Unreachable("connection refused".into())
}

#[async_trait]
impl RecordStore for DownStore {
    async fn list_all(&self, _collection: Collection) -> Result<Vec<Record>, StoreError> {
        Err(down())
    }

    async fn list_where(
        &self,
        _collection: Collection,
        _field: &str,
        _value: &Value,
    ) -> Result<Vec<Record>, StoreError> {
        Err(down())
    }

    async fn get(&self, _collection: Collection, _id: &str) -> Result<Option<Record>, StoreError> {
        Err(down())
    }

    async fn insert(&self, _collection: Collection, _fields: Fields) -> Result<RecordId, StoreError> {
        Err(down())
    }

    async fn update_partial(
        &self,
        _collection: Collection,
        _id: &str,
        _fields: Fields,
    ) -> Result<(), StoreError> {
        Err(down())
    }

    async fn delete(&self, _collection: Collection, _id: &str) -> Result<(), StoreError> {
        Err(down())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err(down())
    }

    async fn subscribe(
        &self,
        _collection: Collection,
        _order_by: &str,
        _direction: SortDirection,
    ) -> Result<RecordStream, StoreError> {
        Err(down())
    }
}
