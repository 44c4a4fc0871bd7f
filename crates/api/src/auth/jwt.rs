//! Session token generation and validation.
//!
//! Session tokens are HS256-signed JWTs containing a [`Claims`] payload. A
//! token lives for the idle timeout; signing in again issues a new one.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shelfwatch_core::session::{Role, DEFAULT_IDLE_TIMEOUT_MINS};
use uuid::Uuid;

use crate::config::{parse_var, ConfigError};

/// JWT claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: admin email or student ID.
    pub sub: String,
    /// `"admin"` or `"student"`.
    pub role: String,
    /// Display name shown in the session banner.
    pub name: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4), used for sign-out.
    pub jti: String,
}

/// Configuration for session token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Session lifetime in minutes (default: 60).
    pub session_idle_mins: i64,
}

impl JwtConfig {
    /// | Env Var             | Required | Default |
    /// |---------------------|----------|---------|
    /// | `JWT_SECRET`        | **yes**  | --      |
    /// | `SESSION_IDLE_MINS` | no       | `60`    |
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing { name: "JWT_SECRET" })?;
        let session_idle_mins =
            parse_var(lookup, "SESSION_IDLE_MINS", DEFAULT_IDLE_TIMEOUT_MINS, "i64")?;
        Ok(Self {
            secret,
            session_idle_mins,
        })
    }
}

/// Generate a session token. Returns the encoded token and its claims.
pub fn generate_session_token(
    subject: &str,
    role: Role,
    display_name: &str,
    config: &JwtConfig,
) -> Result<(String, Claims), jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: subject.to_string(),
        role: role.as_str().to_string(),
        name: display_name.to_string(),
        exp: now + config.session_idle_mins * 60,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;
    Ok((token, claims))
}

/// Validate and decode a session token, returning the embedded [`Claims`].
///
/// Validates the signature and expiration automatically.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            session_idle_mins: 60,
        }
    }

    #[test]
    fn test_generate_and_validate() {
        let config = test_config();
        let (token, issued) = generate_session_token("S-100", Role::Student, "Ada", &config)
            .expect("token generation should succeed");

        let claims = validate_token(&token, &config).expect("token validation should succeed");
        assert_eq!(claims.sub, "S-100");
        assert_eq!(claims.role, "student");
        assert_eq!(claims.name, "Ada");
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn test_expired_token_fails() {
        let config = test_config();

        // Well beyond the default 60-second leeway.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "S-1".to_string(),
            role: "student".to_string(),
            name: "x".to_string(),
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("encoding should succeed");

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn test_different_secrets_fail() {
        let config_a = JwtConfig {
            secret: "secret-alpha".to_string(),
            session_idle_mins: 60,
        };
        let config_b = JwtConfig {
            secret: "secret-bravo".to_string(),
            session_idle_mins: 60,
        };

        let (token, _) = generate_session_token("a@x.test", Role::Admin, "A", &config_a)
            .expect("token generation should succeed");
        assert!(validate_token(&token, &config_b).is_err());
    }

    #[test]
    fn test_empty_secret_is_missing() {
        let lookup = |name: &str| (name == "JWT_SECRET").then(String::new);
        assert!(JwtConfig::from_lookup(&lookup).is_err());
    }
}
