//! Payment API Handlers

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use shared::models::{Payment, PaymentCreate, PaymentQuery, PaymentResult};

use crate::auth::CurrentUser;
use crate::billing::payments;
use crate::core::ServerState;
use crate::utils::AppResult;

/// Payments recorded inside the date range (default: this month)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<PaymentQuery>,
) -> AppResult<Json<Vec<Payment>>> {
    Ok(Json(payments::list(&state, query).await?))
}

/// Record a payment against a sales, purchase or expense invoice
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<PaymentCreate>,
) -> AppResult<Json<PaymentResult>> {
    Ok(Json(payments::record(&state, &user, payload).await?))
}
