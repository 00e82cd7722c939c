//! Monthly salary rows, one per (employee, year, month)

use shared::ErrorCode;
use shared::models::{Salary, SalaryView};
use sqlx::{SqliteConnection, SqlitePool};

use super::{RepoError, RepoResult, employee};
use crate::billing::money;

const COLUMNS: &str = "id, employee_id, year, month, basic_salary, allowances, deductions, \
    previous_salary_due, total_salary, paid_amount, status, created_at, updated_at";

/// Components of a salary row
#[derive(Debug, Clone, Copy, Default)]
pub struct SalaryAmounts {
    pub basic_salary: f64,
    pub allowances: f64,
    pub deductions: f64,
    pub previous_salary_due: f64,
}

#[derive(sqlx::FromRow)]
struct SalaryViewRow {
    #[sqlx(flatten)]
    salary: Salary,
    employee_code: String,
    full_name: String,
    department: Option<String>,
}

pub async fn find_for_month(pool: &SqlitePool, year: i32, month: u32) -> RepoResult<Vec<SalaryView>> {
    let rows = sqlx::query_as::<_, SalaryViewRow>(
        "SELECT s.id, s.employee_id, s.year, s.month, s.basic_salary, s.allowances, s.deductions, \
            s.previous_salary_due, s.total_salary, s.paid_amount, s.status, s.created_at, s.updated_at, \
            e.employee_code, e.full_name, e.department \
         FROM salary s JOIN employee e ON e.id = s.employee_id \
         WHERE s.year = ? AND s.month = ? ORDER BY e.employee_code",
    )
    .bind(year)
    .bind(month as i32)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| SalaryView {
            remaining: money::remaining(r.salary.total_salary, r.salary.paid_amount),
            salary: r.salary,
            employee_code: r.employee_code,
            full_name: r.full_name,
            department: r.department,
        })
        .collect())
}

pub async fn find(
    conn: &mut SqliteConnection,
    employee_id: i64,
    year: i32,
    month: u32,
) -> RepoResult<Option<Salary>> {
    let row = sqlx::query_as::<_, Salary>(&format!(
        "SELECT {COLUMNS} FROM salary WHERE employee_id = ? AND year = ? AND month = ?"
    ))
    .bind(employee_id)
    .bind(year)
    .bind(month as i32)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Salary>> {
    let row = sqlx::query_as::<_, Salary>(&format!("SELECT {COLUMNS} FROM salary WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Salary rows of the given employees between two `(year, month)` keys, inclusive
pub async fn find_range(
    pool: &SqlitePool,
    from_key: i64,
    to_key: i64,
) -> RepoResult<Vec<Salary>> {
    let rows = sqlx::query_as::<_, Salary>(&format!(
        "SELECT {COLUMNS} FROM salary WHERE (year * 100 + month) BETWEEN ? AND ? \
         ORDER BY employee_id, year, month"
    ))
    .bind(from_key)
    .bind(to_key)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Insert or overwrite the amounts of a month; paid amount is kept
pub async fn upsert(
    conn: &mut SqliteConnection,
    employee_id: i64,
    year: i32,
    month: u32,
    amounts: &SalaryAmounts,
) -> RepoResult<Salary> {
    let total = money::salary_total(
        amounts.basic_salary,
        amounts.allowances,
        amounts.deductions,
        amounts.previous_salary_due,
    );
    let paid = find(conn, employee_id, year, month)
        .await?
        .map(|s| s.paid_amount)
        .unwrap_or(0.0);
    let status = money::salary_status(paid, total);
    let now = shared::util::now_millis();

    sqlx::query(
        "INSERT INTO salary (employee_id, year, month, basic_salary, allowances, deductions, \
         previous_salary_due, total_salary, paid_amount, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT (employee_id, year, month) DO UPDATE SET \
            basic_salary = excluded.basic_salary, allowances = excluded.allowances, \
            deductions = excluded.deductions, previous_salary_due = excluded.previous_salary_due, \
            total_salary = excluded.total_salary, status = excluded.status, \
            updated_at = excluded.updated_at",
    )
    .bind(employee_id)
    .bind(year)
    .bind(month as i32)
    .bind(amounts.basic_salary)
    .bind(amounts.allowances)
    .bind(amounts.deductions)
    .bind(amounts.previous_salary_due)
    .bind(total)
    .bind(paid)
    .bind(status)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    find(conn, employee_id, year, month)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to save salary".into()))
}

/// Existing row for the month, or one created from the employee's defaults
pub async fn find_or_create_from_default(
    conn: &mut SqliteConnection,
    employee_id: i64,
    year: i32,
    month: u32,
) -> RepoResult<Salary> {
    if let Some(existing) = find(conn, employee_id, year, month).await? {
        return Ok(existing);
    }
    let defaults = employee::find_salary_default(conn, employee_id)
        .await?
        .ok_or_else(|| {
            RepoError::business(
                ErrorCode::SalaryNotInitialized,
                format!("Employee {employee_id} has no salary for {year}-{month:02} and no salary default"),
            )
        })?;
    upsert(
        conn,
        employee_id,
        year,
        month,
        &SalaryAmounts {
            basic_salary: defaults.base_salary,
            allowances: defaults.allowances,
            deductions: defaults.deductions,
            previous_salary_due: 0.0,
        },
    )
    .await
}

/// Add a payment to a salary row and recompute its status
pub async fn add_payment(conn: &mut SqliteConnection, salary: &Salary, amount: f64) -> RepoResult<Salary> {
    let paid = money::round_money(salary.paid_amount + amount);
    let status = money::salary_status(paid, salary.total_salary);
    sqlx::query("UPDATE salary SET paid_amount = ?, status = ?, updated_at = ? WHERE id = ?")
        .bind(paid)
        .bind(status)
        .bind(shared::util::now_millis())
        .bind(salary.id)
        .execute(&mut *conn)
        .await?;
    find_by_id(conn, salary.id)
        .await?
        .ok_or_else(|| RepoError::business(ErrorCode::SalaryNotFound, format!("Salary {} not found", salary.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::models::{EmployeeCreate, EmployeeStatus, SalaryStatus};

    async fn setup(with_default: bool) -> (SqlitePool, i64) {
        let pool = DbService::memory().await.unwrap().pool;
        let e = employee::create(
            &pool,
            &EmployeeCreate {
                employee_code: "E100".into(),
                full_name: "Yusuf".into(),
                national_id: None,
                department: Some("Service".into()),
                position: None,
                phone: None,
                email: None,
                hire_date: None,
                status: EmployeeStatus::Active,
                salary_default: with_default.then_some(shared::models::SalaryDefaultInput {
                    base_salary: 2000.0,
                    allowances: 300.0,
                    deductions: 100.0,
                }),
            },
        )
        .await
        .unwrap();
        (pool, e.id)
    }

    #[tokio::test]
    async fn created_from_default() {
        let (pool, employee_id) = setup(true).await;
        let mut conn = pool.acquire().await.unwrap();
        let salary = find_or_create_from_default(&mut conn, employee_id, 2025, 4).await.unwrap();
        assert_eq!(salary.total_salary, 2200.0);
        assert_eq!(salary.status, SalaryStatus::Due);

        let salary = add_payment(&mut conn, &salary, 1000.0).await.unwrap();
        assert_eq!(salary.status, SalaryStatus::Partial);
        let salary = add_payment(&mut conn, &salary, 1200.0).await.unwrap();
        assert_eq!(salary.status, SalaryStatus::Paid);
    }

    #[tokio::test]
    async fn missing_default_is_reported() {
        let (pool, employee_id) = setup(false).await;
        let mut conn = pool.acquire().await.unwrap();
        let err = find_or_create_from_default(&mut conn, employee_id, 2025, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::SalaryNotInitialized, _)));
    }

    #[tokio::test]
    async fn upsert_keeps_paid_amount() {
        let (pool, employee_id) = setup(true).await;
        let mut conn = pool.acquire().await.unwrap();
        let salary = find_or_create_from_default(&mut conn, employee_id, 2025, 4).await.unwrap();
        add_payment(&mut conn, &salary, 2200.0).await.unwrap();

        let raised = upsert(
            &mut conn,
            employee_id,
            2025,
            4,
            &SalaryAmounts {
                basic_salary: 2500.0,
                allowances: 300.0,
                deductions: 100.0,
                previous_salary_due: 0.0,
            },
        )
        .await
        .unwrap();
        assert_eq!(raised.paid_amount, 2200.0);
        assert_eq!(raised.total_salary, 2700.0);
        assert_eq!(raised.status, SalaryStatus::Partial);
    }
}
