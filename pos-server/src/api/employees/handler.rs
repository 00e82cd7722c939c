//! Employee API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{Employee, EmployeeCreate, EmployeeStatus, EmployeeUpdate, SalaryDefault, SalaryDefaultInput};

use crate::core::ServerState;
use crate::db::repository::employee;
use crate::utils::time;
use crate::utils::types::DeleteResponse;
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_amount, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<EmployeeStatus>,
}

fn validate_hire_date(hire_date: &Option<String>) -> AppResult<()> {
    if let Some(date) = hire_date.as_deref().filter(|d| !d.trim().is_empty()) {
        time::parse_date(date)?;
    }
    Ok(())
}

fn validate_salary_default(input: &SalaryDefaultInput) -> AppResult<()> {
    validate_amount(input.base_salary, "base_salary")?;
    validate_amount(input.allowances, "allowances")?;
    validate_amount(input.deductions, "deductions")
}

fn validate_contact(
    national_id: &Option<String>,
    department: &Option<String>,
    position: &Option<String>,
    phone: &Option<String>,
    email: &Option<String>,
) -> AppResult<()> {
    validate_optional_text(national_id, "national_id", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(department, "department", MAX_NAME_LEN)?;
    validate_optional_text(position, "position", MAX_NAME_LEN)?;
    validate_optional_text(phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(email, "email", MAX_EMAIL_LEN)
}

/// List employees, optionally by status
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Employee>>> {
    Ok(Json(employee::find_all(&state.pool, query.status).await?))
}

/// Get employee with salary defaults
pub async fn get_by_id(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<Employee>> {
    let found = employee::find_by_id(&state.pool, id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::EmployeeNotFound, format!("Employee {id} not found"))
            .with_detail("id", id)
    })?;
    Ok(Json(found))
}

/// Create an employee (code and national id are unique)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<EmployeeCreate>,
) -> AppResult<Json<Employee>> {
    validate_required_text(&payload.employee_code, "employee_code", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.full_name, "full_name", MAX_NAME_LEN)?;
    validate_contact(
        &payload.national_id,
        &payload.department,
        &payload.position,
        &payload.phone,
        &payload.email,
    )?;
    validate_hire_date(&payload.hire_date)?;
    if let Some(defaults) = &payload.salary_default {
        validate_salary_default(defaults)?;
    }

    let created = employee::create(&state.pool, &payload).await?;
    tracing::info!(
        employee_id = created.id,
        employee_code = %created.employee_code,
        "Employee created"
    );
    Ok(Json(created))
}

/// Update an employee
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<EmployeeUpdate>,
) -> AppResult<Json<Employee>> {
    if let Some(code) = &payload.employee_code {
        validate_required_text(code, "employee_code", MAX_SHORT_TEXT_LEN)?;
    }
    if let Some(name) = &payload.full_name {
        validate_required_text(name, "full_name", MAX_NAME_LEN)?;
    }
    validate_contact(
        &payload.national_id,
        &payload.department,
        &payload.position,
        &payload.phone,
        &payload.email,
    )?;
    validate_hire_date(&payload.hire_date)?;

    Ok(Json(employee::update(&state.pool, id, &payload).await?))
}

/// Delete an employee and their salary rows
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<DeleteResponse>> {
    employee::delete(&state.pool, id).await?;
    tracing::warn!(employee_id = id, "Employee deleted");
    Ok(Json(DeleteResponse { deleted: true }))
}

/// Set default monthly salary components
pub async fn salary_default(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<SalaryDefaultInput>,
) -> AppResult<Json<SalaryDefault>> {
    validate_salary_default(&payload)?;
    Ok(Json(employee::upsert_salary_default(&state.pool, id, &payload).await?))
}
