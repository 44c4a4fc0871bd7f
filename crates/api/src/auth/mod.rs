//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- session token generation and validation.
//! - [`revocation`] -- in-process registry of signed-out token ids.

pub mod jwt;
pub mod password;
pub mod revocation;

/// Record field holding an account's PHC password hash.
pub const PASSWORD_HASH_FIELD: &str = "passwordHash";
