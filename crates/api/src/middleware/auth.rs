//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::DateTime;
use shelfwatch_core::error::CoreError;
use shelfwatch_core::session::{Role, Session, SessionToken};
use shelfwatch_core::types::Timestamp;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Signed-in caller extracted from a JWT Bearer token in the `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(subject = %user.subject, role = user.role.as_str(), "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Student ID for students, email for admins (from `claims.sub`).
    pub subject: String,
    pub role: Role,
    pub display_name: String,
    /// Token identifier (from `claims.jti`), used for sign-out.
    pub token_id: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub token: SessionToken,
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}

impl AuthUser {
    /// Validate a raw token and check it has not been signed out.
    pub async fn from_token(token: &str, state: &AppState) -> Result<Self, AppError> {
        let claims = validate_token(token, &state.config.jwt)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        if state.revoked.is_revoked(&claims.jti).await {
            return Err(unauthorized("Session has been signed out"));
        }

        let role = Role::parse(&claims.role).ok_or_else(|| unauthorized("Unknown role in token"))?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0)
            .ok_or_else(|| unauthorized("Invalid token timestamps"))?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| unauthorized("Invalid token timestamps"))?;

        Ok(AuthUser {
            subject: claims.sub,
            role,
            display_name: claims.name,
            token_id: claims.jti,
            issued_at,
            expires_at,
            token: SessionToken::new(token),
        })
    }

    /// The caller as a domain [`Session`].
    pub fn session(&self) -> Session {
        Session {
            token: self.token.clone(),
            role: self.role,
            subject: self.subject.clone(),
            display_name: self.display_name.clone(),
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))?;

        AuthUser::from_token(token, state).await
    }
}
