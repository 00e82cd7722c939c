//! 工资发放
//!
//! - 月份格式 `YYYY-MM`，不允许未来月份
//! - 当月无工资行时按员工默认工资自动创建 (无默认工资 → SalaryNotInitialized)
//! - 付款金额封顶为剩余应付，已付清的工资拒绝再付

use chrono::Datelike;
use shared::models::{
    BulkPayFailure, BulkPayRequest, BulkPayResult, InvoiceType, MonthQuery, PayRequest, PayResult,
    PaySummaryQuery, PaySummaryRow, Salary, SalaryStatus, SalaryUpsert, SalaryView,
};

use crate::auth::CurrentUser;
use crate::billing::money;
use crate::core::ServerState;
use crate::db::repository::payment::{self, NewPayment};
use crate::db::repository::salary::{self, SalaryAmounts};
use crate::db::repository::employee;
use crate::utils::error::db_error;
use crate::utils::time;
use crate::utils::types::parse_id_list;
use crate::utils::validation::validate_amount;
use crate::utils::{AppError, AppResult, ErrorCode};

const PAYMENT_RESOURCE: &str = "payment";

/// Parse `YYYY-MM`
pub fn parse_month(value: &str) -> AppResult<(i32, u32)> {
    shared::util::parse_year_month(value).ok_or_else(|| {
        AppError::validation(format!("Invalid month '{value}', expected YYYY-MM")).with_detail("month", value)
    })
}

fn current_month(state: &ServerState) -> (i32, u32) {
    let today = time::today(state.tz());
    (today.year(), today.month())
}

/// Month from an optional query value, defaulting to the current month
fn month_or_current(state: &ServerState, value: Option<&str>) -> AppResult<(i32, u32)> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_month(v),
        None => Ok(current_month(state)),
    }
}

fn reject_future(state: &ServerState, year: i32, month: u32) -> AppResult<()> {
    let (cy, cm) = current_month(state);
    if shared::util::month_key(year, month) > shared::util::month_key(cy, cm) {
        return Err(AppError::with_message(
            ErrorCode::FutureMonthNotAllowed,
            format!("{year}-{month:02} is in the future"),
        ));
    }
    Ok(())
}

async fn require_employee(state: &ServerState, id: i64) -> AppResult<shared::models::Employee> {
    employee::find_by_id(&state.pool, id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::EmployeeNotFound, format!("Employee {id} not found"))
            .with_detail("employee_id", id)
    })
}

/// GET /api/salaries?month=YYYY-MM
pub async fn list_salaries(state: &ServerState, query: MonthQuery) -> AppResult<Vec<SalaryView>> {
    let (year, month) = month_or_current(state, query.month.as_deref())?;
    Ok(salary::find_for_month(&state.pool, year, month).await?)
}

/// PUT /api/salaries
pub async fn upsert_salary(state: &ServerState, req: SalaryUpsert) -> AppResult<Salary> {
    let (year, month) = parse_month(&req.month)?;
    validate_amount(req.basic_salary, "basic_salary")?;
    validate_amount(req.allowances, "allowances")?;
    validate_amount(req.deductions, "deductions")?;
    validate_amount(req.previous_salary_due, "previous_salary_due")?;
    require_employee(state, req.employee_id).await?;

    let amounts = SalaryAmounts {
        basic_salary: req.basic_salary,
        allowances: req.allowances,
        deductions: req.deductions,
        previous_salary_due: req.previous_salary_due,
    };
    let mut conn = state.pool.acquire().await.map_err(db_error)?;
    let saved = salary::upsert(&mut conn, req.employee_id, year, month, &amounts).await?;
    tracing::info!(
        employee_id = req.employee_id,
        month = %req.month,
        total = saved.total_salary,
        "Salary saved"
    );
    Ok(saved)
}

/// POST /api/payroll/pay
pub async fn pay(state: &ServerState, user: &CurrentUser, req: &PayRequest) -> AppResult<PayResult> {
    money::validate_payment_amount(req.amount)?;
    let (year, month) = parse_month(&req.month)?;
    reject_future(state, year, month)?;
    require_employee(state, req.employee_id).await?;

    let mut tx = state.pool.begin().await.map_err(db_error)?;
    let row = salary::find_or_create_from_default(&mut tx, req.employee_id, year, month).await?;
    let remaining = money::remaining(row.total_salary, row.paid_amount);
    if row.status == SalaryStatus::Paid || remaining <= 0.0 {
        return Err(AppError::with_message(
            ErrorCode::SalaryAlreadyPaid,
            format!("Salary for {} is already fully paid", req.month),
        )
        .with_detail("salary_id", row.id));
    }

    let amount = money::round_money(req.amount.min(remaining));
    let note = format!("Salary {year}-{month:02}");
    let recorded = payment::insert(
        &mut tx,
        &NewPayment {
            invoice_type: InvoiceType::Salary,
            invoice_id: row.id,
            amount,
            payment_method: req.payment_method,
            note: Some(&note),
            created_by: Some(user.id),
        },
    )
    .await?;
    let updated = salary::add_payment(&mut tx, &row, amount).await?;
    tx.commit().await.map_err(db_error)?;

    if amount < req.amount {
        tracing::info!(requested = req.amount, capped = amount, "Salary payment capped at remaining balance");
    }
    tracing::info!(
        employee_id = req.employee_id,
        salary_id = updated.id,
        amount,
        status = ?updated.status,
        "Salary paid"
    );
    state
        .broadcast_sync(PAYMENT_RESOURCE, "created", &recorded.id.to_string(), Some(&recorded))
        .await;

    Ok(PayResult {
        remaining: money::remaining(updated.total_salary, updated.paid_amount),
        salary: updated,
        payment_id: recorded.id,
        amount_paid: amount,
    })
}

/// POST /api/payroll/pay-bulk: each employee is paid independently
pub async fn pay_bulk(state: &ServerState, user: &CurrentUser, req: BulkPayRequest) -> AppResult<BulkPayResult> {
    money::validate_payment_amount(req.amount)?;
    let (year, month) = parse_month(&req.month)?;
    reject_future(state, year, month)?;
    if req.employee_ids.is_empty() {
        return Err(AppError::validation("employee_ids must not be empty"));
    }

    let mut result = BulkPayResult::default();
    for employee_id in &req.employee_ids {
        let single = PayRequest {
            employee_id: *employee_id,
            month: req.month.clone(),
            amount: req.amount,
            payment_method: req.payment_method,
        };
        match pay(state, user, &single).await {
            Ok(_) => result.success_count += 1,
            Err(e) => {
                tracing::warn!(employee_id, error = %e.message, "Bulk salary payment failed");
                result.failures.push(BulkPayFailure {
                    employee_id: *employee_id,
                    reason: e.message,
                });
            }
        }
    }
    result.failed_count = result.failures.len();
    Ok(result)
}

/// GET /api/payroll/pay-summary
pub async fn pay_summary(state: &ServerState, query: PaySummaryQuery) -> AppResult<Vec<PaySummaryRow>> {
    let (year, month) = month_or_current(state, query.month.as_deref())?;
    let ids = parse_id_list(query.employee_ids.as_deref());
    let employees = employee::find_many(&state.pool, &ids).await?;
    let salaries = salary::find_for_month(&state.pool, year, month).await?;

    Ok(employees
        .into_iter()
        .map(|e| {
            let row = salaries.iter().find(|s| s.salary.employee_id == e.id);
            let basic = row
                .map(|s| s.salary.basic_salary)
                .or_else(|| e.salary_default.as_ref().map(|d| d.base_salary))
                .unwrap_or(0.0);
            PaySummaryRow {
                employee_id: e.id,
                salary_id: row.map(|s| s.salary.id),
                name: e.full_name,
                department: e.department,
                basic,
                total: row.map(|s| s.salary.total_salary).unwrap_or(0.0),
                paid: row.map(|s| s.salary.paid_amount).unwrap_or(0.0),
                remaining: row.map(|s| s.remaining).unwrap_or(0.0),
                status: row.map(|s| s.salary.status),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestEnv, admin};
    use shared::models::{EmployeeCreate, EmployeeStatus, PaymentMethod, SalaryDefaultInput};

    async fn hire(env: &TestEnv, code: &str, base: Option<f64>) -> i64 {
        employee::create(
            &env.state.pool,
            &EmployeeCreate {
                employee_code: code.into(),
                full_name: format!("Employee {code}"),
                national_id: None,
                department: Some("Kitchen".into()),
                position: None,
                phone: None,
                email: None,
                hire_date: None,
                status: EmployeeStatus::Active,
                salary_default: base.map(|b| SalaryDefaultInput {
                    base_salary: b,
                    allowances: 200.0,
                    deductions: 100.0,
                }),
            },
        )
        .await
        .unwrap()
        .id
    }

    fn this_month(env: &TestEnv) -> String {
        let (y, m) = current_month(&env.state);
        format!("{y}-{m:02}")
    }

    fn pay_req(employee_id: i64, month: String, amount: f64) -> PayRequest {
        PayRequest {
            employee_id,
            month,
            amount,
            payment_method: PaymentMethod::Cash,
        }
    }

    #[test]
    fn month_format() {
        assert_eq!(parse_month("2025-03").unwrap(), (2025, 3));
        assert!(parse_month("2025-13").is_err());
        assert!(parse_month("March").is_err());
    }

    #[tokio::test]
    async fn pay_creates_row_from_defaults_and_caps_amount() {
        let env = TestEnv::new().await;
        let emp = hire(&env, "E001", Some(3000.0)).await;
        let month = this_month(&env);

        let first = pay(&env.state, &admin(), &pay_req(emp, month.clone(), 1000.0)).await.unwrap();
        assert_eq!(first.salary.total_salary, 3100.0);
        assert_eq!(first.salary.status, SalaryStatus::Partial);
        assert_eq!(first.remaining, 2100.0);

        let second = pay(&env.state, &admin(), &pay_req(emp, month.clone(), 5000.0)).await.unwrap();
        assert_eq!(second.amount_paid, 2100.0);
        assert_eq!(second.salary.status, SalaryStatus::Paid);

        let err = pay(&env.state, &admin(), &pay_req(emp, month, 1.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SalaryAlreadyPaid);
    }

    #[tokio::test]
    async fn future_month_and_missing_defaults_are_rejected() {
        let env = TestEnv::new().await;
        let emp = hire(&env, "E002", None).await;
        let (y, _) = current_month(&env.state);

        let err = pay(&env.state, &admin(), &pay_req(emp, format!("{}-01", y + 1), 10.0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::FutureMonthNotAllowed);

        let err = pay(&env.state, &admin(), &pay_req(emp, this_month(&env), 10.0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SalaryNotInitialized);
    }

    #[tokio::test]
    async fn bulk_reports_each_failure() {
        let env = TestEnv::new().await;
        let ok = hire(&env, "E003", Some(1000.0)).await;
        let no_default = hire(&env, "E004", None).await;

        let result = pay_bulk(
            &env.state,
            &admin(),
            BulkPayRequest {
                employee_ids: vec![ok, no_default, 9999],
                month: this_month(&env),
                amount: 500.0,
                payment_method: PaymentMethod::Bank,
            },
        )
        .await
        .unwrap();
        assert_eq!(result.success_count, 1);
        assert_eq!(result.failed_count, 2);
        assert_eq!(result.failures[0].employee_id, no_default);

        let summary = pay_summary(
            &env.state,
            PaySummaryQuery {
                month: Some(this_month(&env)),
                employee_ids: Some(format!("{ok},{no_default}")),
            },
        )
        .await
        .unwrap();
        let paid = summary.iter().find(|r| r.employee_id == ok).unwrap();
        assert_eq!(paid.paid, 500.0);
        assert_eq!(paid.status, Some(SalaryStatus::Partial));
        let unset = summary.iter().find(|r| r.employee_id == no_default).unwrap();
        assert!(unset.salary_id.is_none());
    }

    #[tokio::test]
    async fn upsert_keeps_paid_amount() {
        let env = TestEnv::new().await;
        let emp = hire(&env, "E005", Some(1000.0)).await;
        let month = this_month(&env);
        pay(&env.state, &admin(), &pay_req(emp, month.clone(), 400.0)).await.unwrap();

        let saved = upsert_salary(
            &env.state,
            SalaryUpsert {
                employee_id: emp,
                month: month.clone(),
                basic_salary: 2000.0,
                allowances: 0.0,
                deductions: 0.0,
                previous_salary_due: 0.0,
            },
        )
        .await
        .unwrap();
        assert_eq!(saved.total_salary, 2000.0);
        assert_eq!(saved.paid_amount, 400.0);

        let listed = list_salaries(&env.state, MonthQuery { month: Some(month) }).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].remaining, 1600.0);
    }
}
