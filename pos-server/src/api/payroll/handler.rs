//! Salary / Payroll API Handlers

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use shared::models::{
    BulkPayRequest, BulkPayResult, MonthQuery, PayRequest, PayResult, PaySummaryQuery, PaySummaryRow, Salary,
    SalaryUpsert, SalaryView,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::payroll;
use crate::utils::AppResult;

pub async fn list_salaries(
    State(state): State<ServerState>,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<Vec<SalaryView>>> {
    Ok(Json(payroll::list_salaries(&state, query).await?))
}

pub async fn upsert_salary(
    State(state): State<ServerState>,
    Json(payload): Json<SalaryUpsert>,
) -> AppResult<Json<Salary>> {
    Ok(Json(payroll::upsert_salary(&state, payload).await?))
}

pub async fn pay(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<PayRequest>,
) -> AppResult<Json<PayResult>> {
    Ok(Json(payroll::pay(&state, &user, &payload).await?))
}

pub async fn pay_bulk(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<BulkPayRequest>,
) -> AppResult<Json<BulkPayResult>> {
    Ok(Json(payroll::pay_bulk(&state, &user, payload).await?))
}

pub async fn pay_summary(
    State(state): State<ServerState>,
    Query(query): Query<PaySummaryQuery>,
) -> AppResult<Json<Vec<PaySummaryRow>>> {
    Ok(Json(payroll::pay_summary(&state, query).await?))
}
