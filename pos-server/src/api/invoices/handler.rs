//! Sales Invoice API Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use shared::models::{InvoiceDetail, InvoiceQuery, InvoiceVoid, Receipt, SalesInvoice};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::sales::checkout;
use crate::utils::AppResult;
use crate::utils::types::Page;

pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<InvoiceQuery>,
) -> AppResult<Json<Page<SalesInvoice>>> {
    Ok(Json(checkout::list(&state, &user, query).await?))
}

/// Invoice with lines and payments
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<InvoiceDetail>> {
    Ok(Json(checkout::detail(&state, &user, id).await?))
}

/// Printable receipt with the e-invoice QR payload
pub async fn receipt(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Receipt>> {
    Ok(Json(checkout::receipt(&state, &user, id).await?))
}

pub async fn confirm_print(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<SalesInvoice>> {
    Ok(Json(checkout::confirm_print(&state, &user, id).await?))
}

pub async fn void(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<InvoiceVoid>,
) -> AppResult<Json<SalesInvoice>> {
    Ok(Json(checkout::void(&state, &user, id, payload).await?))
}
