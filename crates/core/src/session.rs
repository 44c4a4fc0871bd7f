//! Explicit session context.
//!
//! The signed-in identity is passed around as a [`SessionContext`] value
//! instead of being looked up from ambient storage, so managers and dialogs
//! can be driven in tests with [`MemorySessionStorage`].

use std::fmt;
use std::sync::RwLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::schema::Audience;
use crate::types::Timestamp;

/// Observed idle timeout before a session must sign in again.
pub const DEFAULT_IDLE_TIMEOUT_MINS: i64 = 60;

/// Who is signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "student" => Some(Self::Student),
            _ => None,
        }
    }

    pub fn audience(self) -> Audience {
        match self {
            Self::Admin => Audience::Admin,
            Self::Student => Audience::Student,
        }
    }
}

/// Opaque bearer token. Never logged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: SessionToken,
    pub role: Role,
    /// Student ID for students, email for admins.
    pub subject: String,
    pub display_name: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl Session {
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// Owner value that scopes a student's read views; `None` for admins.
    pub fn owner_scope(&self) -> Option<&str> {
        match self.role {
            Role::Student => Some(&self.subject),
            Role::Admin => None,
        }
    }
}

/// Client-side persistence of the current session.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Option<Session>;
    fn save(&self, session: &Session);
    fn clear(&self);
}

/// Process-local [`SessionStorage`].
#[derive(Default)]
pub struct MemorySessionStorage {
    slot: RwLock<Option<Session>>,
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Option<Session> {
        self.slot
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn save(&self, session: &Session) {
        *self
            .slot
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(session.clone());
    }

    fn clear(&self) {
        *self
            .slot
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }
}

/// The signed-in identity, handed explicitly to whatever needs it.
pub struct SessionContext<S: SessionStorage> {
    storage: S,
}

impl<S: SessionStorage> SessionContext<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Persist a freshly issued session.
    pub fn begin(&self, session: Session) -> Session {
        self.storage.save(&session);
        session
    }

    pub fn current_session(&self) -> Option<Session> {
        self.current_session_at(Utc::now())
    }

    /// The stored session, unless it has expired by `now` (in which case it
    /// is cleared).
    pub fn current_session_at(&self, now: Timestamp) -> Option<Session> {
        let session = self.storage.load()?;
        if session.is_expired_at(now) {
            tracing::info!(subject = %session.subject, "Session expired, clearing");
            self.storage.clear();
            return None;
        }
        Some(session)
    }

    pub fn logout(&self) {
        self.storage.clear();
    }
}
