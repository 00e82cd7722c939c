//! Authentication Handlers
//!
//! Handles login, current user info and password changes

use std::time::Duration;

use axum::{Extension, Json, extract::State};

use crate::AppError;
use crate::auth::{CurrentUser, password};
use crate::core::ServerState;
use crate::db::repository::user;
use crate::security_log;
use crate::utils::types::AckResponse;
use crate::utils::validation::MAX_PASSWORD_LEN;

use shared::ErrorCode;
use shared::client::{ChangePasswordRequest, LoginRequest, LoginResponse, UserInfo};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// Minimum login password length
pub(crate) const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn validate_new_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::with_message(
            ErrorCode::PasswordTooShort,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password is too long (max {MAX_PASSWORD_LEN})"
        )));
    }
    Ok(())
}

/// Login handler
///
/// Authenticates user credentials and returns a JWT token
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = req.username.trim().to_string();
    let found = user::find_with_hash(&state.pool, &username).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message to prevent username enumeration
    let account = match found {
        Some((account, hash)) => {
            let password_valid = password::verify_password(&req.password, &hash)
                .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;

            if !password_valid {
                security_log!("WARN", "login_failed", username = username.clone(), reason = "invalid_credentials");
                return Err(AppError::invalid_credentials());
            }
            if !account.is_active {
                security_log!("WARN", "login_failed", username = username.clone(), reason = "account_disabled");
                return Err(AppError::with_message(
                    ErrorCode::AccountDisabled,
                    "Account has been disabled",
                ));
            }
            account
        }
        None => {
            security_log!("WARN", "login_failed", username = username.clone(), reason = "user_not_found");
            return Err(AppError::invalid_credentials());
        }
    };

    let permissions = user::permission_strings(&state.pool, &account).await?;
    let jwt_service = state.jwt_service();
    let token = jwt_service
        .generate_token(account.id, &account.username, account.role.as_str(), &permissions)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(
        user_id = account.id,
        username = %account.username,
        role = account.role.as_str(),
        "User logged in successfully"
    );

    Ok(Json(LoginResponse {
        token,
        expires_in: jwt_service.expires_in_secs(),
        user: UserInfo {
            id: account.id,
            username: account.username,
            role: account.role.as_str().to_string(),
            permissions,
        },
    }))
}

/// Get current user info
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<UserInfo> {
    Json(UserInfo {
        id: user.id,
        username: user.username,
        role: user.role,
        permissions: user.permissions,
    })
}

/// Change own password
pub async fn change_password(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<AckResponse>, AppError> {
    validate_new_password(&req.new_password)?;

    let hash = user::find_password_hash(&state.pool, current.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {}", current.id)))?;
    let valid = password::verify_password(&req.current_password, &hash)
        .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;
    if !valid {
        security_log!(
            "WARN",
            "password_change_failed",
            user_id = current.id,
            username = current.username.clone()
        );
        return Err(AppError::invalid_credentials());
    }

    user::set_password(&state.pool, current.id, &req.new_password).await?;
    tracing::info!(user_id = current.id, username = %current.username, "Password changed");
    Ok(Json(AckResponse::ok()))
}
