//! Supervisor password
//!
//! A shared secret (argon2 hash in the settings row) that authorizes
//! quantity reductions, draft cancellation and invoice voids.

use crate::auth::{CurrentUser, password};
use crate::core::ServerState;
use crate::db::repository::settings;
use crate::security_log;
use crate::utils::{AppError, AppResult, ErrorCode};

/// Check a candidate password; `false` when no password is configured
pub async fn check(state: &ServerState, candidate: &str) -> AppResult<bool> {
    let Some(hash) = settings::supervisor_hash(&state.pool).await? else {
        tracing::warn!("Supervisor password is not configured");
        return Ok(false);
    };
    password::verify_password(candidate, &hash)
        .map_err(|e| AppError::internal(format!("Stored supervisor hash is unreadable: {e}")))
}

/// Require a valid supervisor password for `operation`
pub async fn require(
    state: &ServerState,
    user: &CurrentUser,
    candidate: Option<&str>,
    operation: &str,
) -> AppResult<()> {
    let candidate = candidate.map(str::trim).filter(|p| !p.is_empty());
    let Some(candidate) = candidate else {
        return Err(AppError::new(ErrorCode::SupervisorPasswordRequired).with_detail("operation", operation));
    };
    if check(state, candidate).await? {
        return Ok(());
    }
    security_log!(
        "WARN",
        "supervisor_password_invalid",
        user_id = user.id,
        username = user.username.clone(),
        operation = operation.to_string()
    );
    Err(AppError::new(ErrorCode::SupervisorPasswordInvalid).with_detail("operation", operation))
}

/// Replace the supervisor password after verifying the current one
pub async fn change(
    state: &ServerState,
    user: &CurrentUser,
    current_password: &str,
    new_password: &str,
) -> AppResult<()> {
    require(state, user, Some(current_password), "change_supervisor_password").await?;
    let new_password = new_password.trim();
    if new_password.len() < 4 {
        return Err(AppError::with_message(
            ErrorCode::PasswordTooShort,
            "Supervisor password must be at least 4 characters",
        ));
    }
    let hash = password::hash_password(new_password)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;
    settings::set_supervisor_hash(&state.pool, &hash).await?;
    security_log!(
        "INFO",
        "supervisor_password_changed",
        user_id = user.id,
        username = user.username.clone()
    );
    Ok(())
}
