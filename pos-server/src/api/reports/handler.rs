//! Report API Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use shared::models::{PayrollReport, PayrollReportQuery, PayrollStatement, ReportQuery, SummaryReport, TabularReport};

use crate::auth::{CurrentUser, ensure_branch_permission};
use crate::core::ServerState;
use crate::reports::{self, ReportKind};
use crate::utils::AppResult;

const REPORT_PERMISSION: &str = "reports:view";

/// A branch-scoped grant only covers its own branch; `all` needs an unscoped grant
fn check_branch(user: &CurrentUser, query: &ReportQuery) -> AppResult<()> {
    let branch = query.branch.as_deref().filter(|b| !b.is_empty()).unwrap_or("all");
    ensure_branch_permission(user, REPORT_PERMISSION, branch)
}

pub async fn summary(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<SummaryReport>> {
    check_branch(&user, &query)?;
    Ok(Json(reports::summary(&state, query).await?))
}

async fn tabular(
    state: &ServerState,
    user: &CurrentUser,
    kind: ReportKind,
    query: ReportQuery,
) -> AppResult<Json<TabularReport>> {
    check_branch(user, &query)?;
    Ok(Json(reports::tabular(state, kind, query).await?))
}

pub async fn sales(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<TabularReport>> {
    tabular(&state, &user, ReportKind::Sales, query).await
}

pub async fn purchases(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<TabularReport>> {
    tabular(&state, &user, ReportKind::Purchases, query).await
}

pub async fn expenses(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<TabularReport>> {
    tabular(&state, &user, ReportKind::Expenses, query).await
}

pub async fn payroll(
    State(state): State<ServerState>,
    Query(query): Query<PayrollReportQuery>,
) -> AppResult<Json<PayrollReport>> {
    Ok(Json(reports::payroll(&state, query).await?))
}

pub async fn payroll_statement(
    State(state): State<ServerState>,
    Path(employee_id): Path<i64>,
    Query(query): Query<PayrollReportQuery>,
) -> AppResult<Json<PayrollStatement>> {
    Ok(Json(reports::payroll_statement(&state, employee_id, query).await?))
}
