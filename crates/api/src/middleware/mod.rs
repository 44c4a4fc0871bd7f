//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the signed-in session from a Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`rbac::RequireStudent`] -- Requires the `student` role.
//! - [`rbac::RequireAuth`] -- Requires any signed-in session.

pub mod auth;
pub mod rbac;
