//! User API Handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::models::{PermissionsUpdate, ScreenPermission, User, UserCreate, UserRole, UserUpdate};

use crate::api::auth::validate_new_password;
use crate::auth::CurrentUser;
use crate::auth::permissions::{DEFAULT_STAFF_PERMISSIONS, is_valid_screen, rows_from_strings};
use crate::core::ServerState;
use crate::db::repository::{branch, user};
use crate::security_log;
use crate::utils::types::DeleteResponse;
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode};

fn user_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::UserNotFound, format!("User {id} not found")).with_detail("id", id)
}

async fn load(state: &ServerState, id: i64) -> AppResult<User> {
    user::find_by_id(&state.pool, id).await?.ok_or_else(|| user_not_found(id))
}

/// The last active admin can be neither demoted, disabled nor deleted
async fn ensure_not_last_admin(state: &ServerState, target: &User, code: ErrorCode) -> AppResult<()> {
    if target.role == UserRole::Admin
        && target.is_active
        && user::count_active_admins(&state.pool).await? <= 1
    {
        return Err(AppError::with_message(code, "At least one active admin is required")
            .with_detail("id", target.id));
    }
    Ok(())
}

/// List all users
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(user::find_all(&state.pool).await?))
}

/// Create a user; staff accounts start with the POS cashier permissions
pub async fn create(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<User>> {
    validate_required_text(&payload.username, "username", MAX_SHORT_TEXT_LEN)?;
    validate_new_password(&payload.password)?;

    let permissions = match payload.role {
        UserRole::Staff => rows_from_strings(DEFAULT_STAFF_PERMISSIONS),
        _ => Vec::new(),
    };
    let created = user::create_with_permissions(&state.pool, &payload, &permissions).await?;

    tracing::info!(
        user_id = created.id,
        username = %created.username,
        role = created.role.as_str(),
        created_by = %current.username,
        "User created"
    );
    Ok(Json(created))
}

/// Update password, role or active flag
pub async fn update(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    if let Some(password) = &payload.password {
        validate_new_password(password)?;
    }
    let target = load(&state, id).await?;
    let demoted = payload.role.is_some_and(|r| r != UserRole::Admin);
    let disabled = payload.is_active == Some(false);
    if demoted || disabled {
        ensure_not_last_admin(&state, &target, ErrorCode::CannotModifyAdmin).await?;
    }

    let updated = user::update(&state.pool, id, &payload).await?;
    if payload.password.is_some() || payload.role.is_some() || disabled {
        security_log!(
            "INFO",
            "user_updated",
            user_id = id,
            username = updated.username.clone(),
            by = current.username.clone()
        );
    }
    Ok(Json(updated))
}

/// Delete a user (never yourself, never the last admin)
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<DeleteResponse>> {
    if id == current.id {
        return Err(AppError::new(ErrorCode::UserCannotDeleteSelf));
    }
    let target = load(&state, id).await?;
    ensure_not_last_admin(&state, &target, ErrorCode::CannotDeleteAdmin).await?;

    let deleted = user::delete(&state.pool, id).await?;
    tracing::warn!(user_id = id, username = %target.username, by = %current.username, "User deleted");
    Ok(Json(DeleteResponse { deleted }))
}

/// Permission rows of a user
pub async fn get_permissions(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<ScreenPermission>>> {
    load(&state, id).await?;
    Ok(Json(user::find_permissions(&state.pool, id).await?))
}

/// Replace the permission rows of a user
///
/// Takes effect at the user's next login.
pub async fn replace_permissions(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<PermissionsUpdate>,
) -> AppResult<Json<Vec<ScreenPermission>>> {
    let target = load(&state, id).await?;
    for row in &payload.permissions {
        if !is_valid_screen(&row.screen) {
            return Err(AppError::validation(format!("Unknown screen '{}'", row.screen))
                .with_detail("screen", row.screen.clone()));
        }
        if row.branch_scope != "all" && branch::find(&state.pool, &row.branch_scope).await?.is_none() {
            return Err(AppError::with_message(
                ErrorCode::BranchNotFound,
                format!("Branch '{}' not found", row.branch_scope),
            )
            .with_detail("branch", row.branch_scope.clone()));
        }
    }

    let rows = user::replace_permissions(&state.pool, id, &payload.permissions).await?;
    security_log!(
        "INFO",
        "permissions_replaced",
        user_id = id,
        username = target.username.clone(),
        by = current.username.clone(),
        rows = rows.len()
    );
    Ok(Json(rows))
}
