//! Handlers for the `/auth` resource (login, logout, session).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shelfwatch_core::collection::{Collection, OWNER_FIELD};
use shelfwatch_core::error::CoreError;
use shelfwatch_core::record::Record;
use shelfwatch_core::session::Role;
use shelfwatch_core::store::RecordStore;
use shelfwatch_core::types::Timestamp;

use crate::auth::jwt::generate_session_token;
use crate::auth::password::verify_password;
use crate::auth::PASSWORD_HASH_FIELD;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
///
/// `id_or_email` is an admin email, a student ID, or a student email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub id_or_email: String,
    pub password: String,
}

/// Successful sign-in response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Session lifetime in seconds.
    pub expires_in: i64,
    pub session: SessionInfo,
}

/// Public session info; never carries the token itself.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub role: Role,
    pub subject: String,
    pub display_name: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl From<&AuthUser> for SessionInfo {
    fn from(user: &AuthUser) -> Self {
        Self {
            role: user.role,
            subject: user.subject.clone(),
            display_name: user.display_name.clone(),
            issued_at: user.issued_at,
            expires_at: user.expires_at,
        }
    }
}

/// An account document matched by the sign-in identifier.
struct Principal {
    role: Role,
    subject: String,
    display_name: String,
    password_hash: Option<String>,
}

impl Principal {
    fn from_record(record: &Record, role: Role, subject_field: &str) -> Option<Self> {
        let subject = record.str_field(subject_field)?.to_string();
        let display_name = record.display("name").unwrap_or_else(|| subject.clone());
        Some(Self {
            role,
            subject,
            display_name,
            password_hash: record.str_field(PASSWORD_HASH_FIELD).map(str::to_string),
        })
    }
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid ID/email or password".into(),
    ))
}

/// Look up the account for a sign-in identifier: admins by email first, then
/// students by student ID, then students by email.
async fn find_principal(
    store: &dyn RecordStore,
    id_or_email: &str,
) -> Result<Option<Principal>, AppError> {
    let needle = Value::String(id_or_email.to_string());

    let admins = store.list_where(Collection::Admins, "email", &needle).await?;
    if let Some(p) = admins
        .iter()
        .find_map(|r| Principal::from_record(r, Role::Admin, "email"))
    {
        return Ok(Some(p));
    }

    for field in [OWNER_FIELD, "email"] {
        let students = store.list_where(Collection::Students, field, &needle).await?;
        if let Some(p) = students
            .iter()
            .find_map(|r| Principal::from_record(r, Role::Student, OWNER_FIELD))
        {
            return Ok(Some(p));
        }
    }

    Ok(None)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Sign in with an ID or email and a password. Returns a session token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<LoginResponse>>> {
    let id_or_email = input.id_or_email.trim();
    if id_or_email.is_empty() || input.password.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "ID/email and password are required".into(),
        )));
    }

    // 1. Resolve the account.
    let principal = find_principal(state.store.as_ref(), id_or_email)
        .await?
        .ok_or_else(invalid_credentials)?;

    // 2. Verify password. Accounts without a stored hash cannot sign in.
    let hash = principal
        .password_hash
        .as_deref()
        .ok_or_else(invalid_credentials)?;
    let password_valid = verify_password(&input.password, hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(role = principal.role.as_str(), "Rejected sign-in attempt");
        return Err(invalid_credentials());
    }

    // 3. Issue the session token.
    let (token, claims) = generate_session_token(
        &principal.subject,
        principal.role,
        &principal.display_name,
        &state.config.jwt,
    )
    .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(
        subject = %principal.subject,
        role = principal.role.as_str(),
        "Signed in",
    );

    let issued_at = chrono::DateTime::from_timestamp(claims.iat, 0)
        .ok_or_else(|| AppError::InternalError("Invalid issue timestamp".into()))?;
    let expires_at = chrono::DateTime::from_timestamp(claims.exp, 0)
        .ok_or_else(|| AppError::InternalError("Invalid expiry timestamp".into()))?;

    Ok(Json(DataResponse {
        data: LoginResponse {
            token,
            expires_in: claims.exp - claims.iat,
            session: SessionInfo {
                role: principal.role,
                subject: principal.subject,
                display_name: principal.display_name,
                issued_at,
                expires_at,
            },
        },
    }))
}

/// POST /api/v1/auth/logout
///
/// Sign out: the token is rejected from now until it would have expired.
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> StatusCode {
    state.revoked.revoke(&user.token_id, user.expires_at).await;
    tracing::info!(subject = %user.subject, "Signed out");
    StatusCode::NO_CONTENT
}

/// GET /api/v1/auth/session
///
/// The current session, for restoring the session banner.
pub async fn session(user: AuthUser) -> Json<DataResponse<SessionInfo>> {
    Json(DataResponse {
        data: SessionInfo::from(&user),
    })
}
