//! Startup seeding of the first admin account.

use serde_json::{json, Value};
use shelfwatch_core::collection::Collection;
use shelfwatch_core::record::fields;
use shelfwatch_core::store::RecordStore;

use crate::auth::password::hash_password;
use crate::auth::PASSWORD_HASH_FIELD;
use crate::config::BootstrapAdmin;
use crate::error::{AppError, AppResult};

/// Insert the configured admin when the `Admins` collection is empty.
///
/// Returns `true` if an account was created. An existing admin of any email
/// leaves the collection untouched.
pub async fn ensure_bootstrap_admin(
    store: &dyn RecordStore,
    admin: &BootstrapAdmin,
) -> AppResult<bool> {
    if !store.list_all(Collection::Admins).await?.is_empty() {
        tracing::debug!("Admins already present, skipping bootstrap");
        return Ok(false);
    }

    let hash = hash_password(&admin.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    let id = store
        .insert(
            Collection::Admins,
            fields([
                ("email", json!(admin.email)),
                ("name", json!("Administrator")),
                (PASSWORD_HASH_FIELD, Value::String(hash)),
            ]),
        )
        .await?;

    tracing::info!(email = %admin.email, record_id = %id, "Bootstrap admin created");
    Ok(true)
}
