//! Draft Order API Handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::models::{
    CheckoutRequest, CheckoutResponse, DraftCancel, DraftOrder, DraftSave, DraftSaveResult, DraftView,
    OrderPreview,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::sales::{checkout as sales_checkout, draft};
use crate::utils::AppResult;

/// Active draft of a table, `null` when the table is free
pub async fn get(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path((branch, table)): Path<(String, i64)>,
) -> AppResult<Json<Option<DraftView>>> {
    Ok(Json(draft::get(&state, &user, &branch, table).await?))
}

/// Upsert the draft of a table
pub async fn save(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path((branch, table)): Path<(String, i64)>,
    Json(payload): Json<DraftSave>,
) -> AppResult<Json<DraftSaveResult>> {
    Ok(Json(draft::save(&state, &user, &branch, table, payload).await?))
}

pub async fn cancel(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<DraftCancel>,
) -> AppResult<Json<DraftOrder>> {
    Ok(Json(draft::cancel(&state, &user, id, payload).await?))
}

pub async fn checkout(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutResponse>> {
    Ok(Json(sales_checkout::checkout_draft(&state, &user, id, payload).await?))
}

/// Kitchen / pre-bill preview
pub async fn preview(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path((branch, table)): Path<(String, i64)>,
) -> AppResult<Json<OrderPreview>> {
    Ok(Json(draft::preview(&state, &user, &branch, table).await?))
}
