//! Table / Layout API Handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::models::{Branch, TableLayout, TableStatusView};

use crate::auth::{CurrentUser, ensure_branch_permission};
use crate::core::ServerState;
use crate::db::repository::{branch, layout};
use crate::sales::require_branch;
use crate::utils::AppResult;

const LAYOUT_RESOURCE: &str = "layout";

/// Configured branches
pub async fn branches(State(state): State<ServerState>) -> AppResult<Json<Vec<Branch>>> {
    Ok(Json(branch::find_all(&state.pool).await?))
}

/// Table grid: status of every table in the branch
pub async fn statuses(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(code): Path<String>,
) -> AppResult<Json<Vec<TableStatusView>>> {
    require_branch(&state, &code).await?;
    ensure_branch_permission(&user, "tables:view", &code)?;
    Ok(Json(branch::table_statuses(&state.pool, &code).await?))
}

pub async fn get_layout(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(code): Path<String>,
) -> AppResult<Json<TableLayout>> {
    require_branch(&state, &code).await?;
    ensure_branch_permission(&user, "tables:view", &code)?;
    Ok(Json(layout::get(&state.pool, &code).await?))
}

/// Replace the branch layout; unknown table numbers are created
pub async fn save_layout(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(code): Path<String>,
    Json(payload): Json<TableLayout>,
) -> AppResult<Json<TableLayout>> {
    require_branch(&state, &code).await?;
    ensure_branch_permission(&user, "tables:edit", &code)?;

    let saved = layout::save(&state.pool, &code, &payload).await?;
    tracing::info!(
        branch = %code,
        sections = saved.sections.len(),
        user = %user.username,
        "Table layout saved"
    );
    state
        .broadcast_branch_sync(LAYOUT_RESOURCE, "updated", &code, &code, Some(&saved))
        .await;
    Ok(Json(saved))
}
