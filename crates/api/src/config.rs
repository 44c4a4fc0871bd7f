use std::fmt;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// A missing or unparsable configuration value.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: &'static str },

    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Read an optional variable, falling back to `default` when unset.
pub(crate) fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value: raw,
        }),
    }
}

/// Credentials for the admin account seeded into an empty `Admins` collection.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"..")
            .finish()
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Session token configuration (secret, idle lifetime).
    pub jwt: JwtConfig,
    /// Seed admin, present only when both bootstrap variables are set.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `JWT_SECRET`               | required                   |
    /// | `SESSION_IDLE_MINS`        | `60`                       |
    /// | `BOOTSTRAP_ADMIN_EMAIL`    | unset                      |
    /// | `BOOTSTRAP_ADMIN_PASSWORD` | unset                      |
    ///
    /// # Panics
    ///
    /// Panics on a missing secret or an unparsable value so misconfiguration
    /// fails at startup.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
            .unwrap_or_else(|e| panic!("Invalid configuration: {e}"))
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_var(&lookup, "PORT", 3000u16, "u16")?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 30u64, "u64")?;
        let jwt = JwtConfig::from_lookup(&lookup)?;

        let bootstrap_admin = match (
            lookup("BOOTSTRAP_ADMIN_EMAIL"),
            lookup("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin {
                    email: email.trim().to_string(),
                    password,
                })
            }
            _ => None,
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
            bootstrap_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ServerConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s")])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.jwt.session_idle_mins, 60);
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,,"),
        ]))
        .unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn missing_secret_is_an_error() {
        let result = ServerConfig::from_lookup(lookup_from(&[]));
        assert_matches!(result, Err(ConfigError::Missing { name: "JWT_SECRET" }));
    }

    #[test]
    fn bad_port_is_an_error() {
        let result =
            ServerConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s"), ("PORT", "http")]));
        assert_matches!(result, Err(ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn bootstrap_admin_needs_both_values() {
        let only_email = ServerConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s"),
            ("BOOTSTRAP_ADMIN_EMAIL", "root@library.test"),
        ]))
        .unwrap();
        assert!(only_email.bootstrap_admin.is_none());

        let both = ServerConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s"),
            ("BOOTSTRAP_ADMIN_EMAIL", "root@library.test"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "hunter22"),
        ]))
        .unwrap();
        let admin = both.bootstrap_admin.unwrap();
        assert_eq!(admin.email, "root@library.test");
        assert!(!format!("{admin:?}").contains("hunter22"));
    }
}
