//! Purchase Invoice API Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use shared::models::{PurchaseCreate, PurchaseInvoice};

use crate::auth::CurrentUser;
use crate::billing::documents;
use crate::core::ServerState;
use crate::utils::AppResult;
use crate::utils::types::{DateRangeQuery, DeleteResponse};

/// Purchases dated inside the range (default: this month)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<Vec<PurchaseInvoice>>> {
    Ok(Json(documents::list_purchases(&state, query).await?))
}

pub async fn get_by_id(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<PurchaseInvoice>> {
    Ok(Json(documents::get_purchase(&state, id).await?))
}

pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<PurchaseCreate>,
) -> AppResult<Json<PurchaseInvoice>> {
    Ok(Json(documents::create_purchase(&state, &user, payload).await?))
}

pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<DeleteResponse>> {
    documents::delete_purchase(&state, &user, id).await?;
    Ok(Json(DeleteResponse { deleted: true }))
}
