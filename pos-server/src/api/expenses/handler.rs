//! Expense Invoice API Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use shared::models::{ExpenseCreate, ExpenseInvoice};

use crate::auth::CurrentUser;
use crate::billing::documents;
use crate::core::ServerState;
use crate::utils::AppResult;
use crate::utils::types::{DateRangeQuery, DeleteResponse};

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<Vec<ExpenseInvoice>>> {
    Ok(Json(documents::list_expenses(&state, query).await?))
}

pub async fn get_by_id(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<ExpenseInvoice>> {
    Ok(Json(documents::get_expense(&state, id).await?))
}

pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ExpenseCreate>,
) -> AppResult<Json<ExpenseInvoice>> {
    Ok(Json(documents::create_expense(&state, &user, payload).await?))
}

pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<DeleteResponse>> {
    documents::delete_expense(&state, &user, id).await?;
    Ok(Json(DeleteResponse { deleted: true }))
}
