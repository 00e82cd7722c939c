//! Employee / Salary Model

use super::invoice::PaymentMethod;
use serde::{Deserialize, Serialize};

/// Employment status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

/// Employee entity (payroll staff, not a login account)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Employee {
    pub id: i64,
    pub employee_code: String,
    pub full_name: String,
    pub national_id: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// YYYY-MM-DD
    pub hire_date: Option<String>,
    pub status: EmployeeStatus,
    pub created_at: i64,
    pub updated_at: i64,

    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub salary_default: Option<SalaryDefault>,
}

/// Create employee payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeCreate {
    pub employee_code: String,
    pub full_name: String,
    pub national_id: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub hire_date: Option<String>,
    #[serde(default)]
    pub status: EmployeeStatus,
    pub salary_default: Option<SalaryDefaultInput>,
}

/// Update employee payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EmployeeUpdate {
    pub employee_code: Option<String>,
    pub full_name: Option<String>,
    pub national_id: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub hire_date: Option<String>,
    pub status: Option<EmployeeStatus>,
}

/// Default monthly salary components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SalaryDefault {
    pub employee_id: i64,
    pub base_salary: f64,
    pub allowances: f64,
    pub deductions: f64,
    pub updated_at: i64,
}

/// Salary default input (`PUT /api/employees/{id}/salary-default`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryDefaultInput {
    pub base_salary: f64,
    #[serde(default)]
    pub allowances: f64,
    #[serde(default)]
    pub deductions: f64,
}

/// Salary settlement state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum SalaryStatus {
    Due,
    Partial,
    Paid,
}

/// Monthly salary row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Salary {
    pub id: i64,
    pub employee_id: i64,
    pub year: i32,
    pub month: i32,
    pub basic_salary: f64,
    pub allowances: f64,
    pub deductions: f64,
    pub previous_salary_due: f64,
    pub total_salary: f64,
    pub paid_amount: f64,
    pub status: SalaryStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Salary list row with employee info (`GET /api/salaries`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryView {
    #[serde(flatten)]
    pub salary: Salary,
    pub employee_code: String,
    pub full_name: String,
    pub department: Option<String>,
    pub remaining: f64,
}

/// Upsert salary payload (`PUT /api/salaries`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryUpsert {
    pub employee_id: i64,
    /// YYYY-MM
    pub month: String,
    pub basic_salary: f64,
    #[serde(default)]
    pub allowances: f64,
    #[serde(default)]
    pub deductions: f64,
    #[serde(default)]
    pub previous_salary_due: f64,
}

/// Month filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

/// Pay one employee (`POST /api/payroll/pay`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayRequest {
    pub employee_id: i64,
    pub month: String,
    pub amount: f64,
    pub payment_method: PaymentMethod,
}

/// Pay several employees the same amount
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkPayRequest {
    pub employee_ids: Vec<i64>,
    pub month: String,
    pub amount: f64,
    pub payment_method: PaymentMethod,
}

/// Single payment outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayResult {
    pub salary: Salary,
    pub payment_id: i64,
    pub amount_paid: f64,
    pub remaining: f64,
}

/// Per-employee failure in a bulk run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkPayFailure {
    pub employee_id: i64,
    pub reason: String,
}

/// Bulk payment outcome
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkPayResult {
    pub success_count: usize,
    pub failed_count: usize,
    pub failures: Vec<BulkPayFailure>,
}

/// Pay summary query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaySummaryQuery {
    pub month: Option<String>,
    /// Comma separated ids
    pub employee_ids: Option<String>,
}

/// Pay summary row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaySummaryRow {
    pub employee_id: i64,
    pub salary_id: Option<i64>,
    pub name: String,
    pub department: Option<String>,
    pub basic: f64,
    pub total: f64,
    pub paid: f64,
    pub remaining: f64,
    pub status: Option<SalaryStatus>,
}
