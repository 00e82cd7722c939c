//! Employee database operations

use shared::ErrorCode;
use shared::models::{
    Employee, EmployeeCreate, EmployeeStatus, EmployeeUpdate, SalaryDefault, SalaryDefaultInput,
};
use sqlx::{SqliteConnection, SqlitePool};

use super::{RepoError, RepoResult};

const COLUMNS: &str = "id, employee_code, full_name, national_id, department, position, phone, \
    email, hire_date, status, created_at, updated_at";

fn not_found(id: i64) -> RepoError {
    RepoError::business(ErrorCode::EmployeeNotFound, format!("Employee {id} not found"))
}

fn map_duplicate(err: sqlx::Error) -> RepoError {
    match RepoError::from(err) {
        RepoError::Duplicate(msg) => RepoError::business(
            ErrorCode::EmployeeCodeExists,
            format!("Employee code or national id already exists ({msg})"),
        ),
        other => other,
    }
}

pub async fn find_all(pool: &SqlitePool, status: Option<EmployeeStatus>) -> RepoResult<Vec<Employee>> {
    let mut rows = sqlx::query_as::<_, Employee>(&format!(
        "SELECT {COLUMNS} FROM employee WHERE (? IS NULL OR status = ?) ORDER BY employee_code"
    ))
    .bind(status)
    .bind(status)
    .fetch_all(pool)
    .await?;

    let defaults = sqlx::query_as::<_, SalaryDefault>(
        "SELECT employee_id, base_salary, allowances, deductions, updated_at FROM employee_salary_default",
    )
    .fetch_all(pool)
    .await?;
    for employee in &mut rows {
        employee.salary_default = defaults.iter().find(|d| d.employee_id == employee.id).cloned();
    }
    Ok(rows)
}

/// Employees by id; an empty list means all employees
pub async fn find_many(pool: &SqlitePool, ids: &[i64]) -> RepoResult<Vec<Employee>> {
    let all = find_all(pool, None).await?;
    if ids.is_empty() {
        return Ok(all);
    }
    Ok(all.into_iter().filter(|e| ids.contains(&e.id)).collect())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Employee>> {
    let employee = sqlx::query_as::<_, Employee>(&format!("SELECT {COLUMNS} FROM employee WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let Some(mut employee) = employee else {
        return Ok(None);
    };
    let mut conn = pool.acquire().await?;
    employee.salary_default = find_salary_default(&mut conn, id).await?;
    Ok(Some(employee))
}

pub async fn create(pool: &SqlitePool, data: &EmployeeCreate) -> RepoResult<Employee> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;
    let id = sqlx::query(
        "INSERT INTO employee (employee_code, full_name, national_id, department, position, phone, \
         email, hire_date, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(data.employee_code.trim())
    .bind(data.full_name.trim())
    .bind(&data.national_id)
    .bind(&data.department)
    .bind(&data.position)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.hire_date)
    .bind(data.status)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(map_duplicate)?
    .last_insert_rowid();

    if let Some(defaults) = &data.salary_default {
        upsert_salary_default_in(&mut tx, id, defaults).await?;
    }
    tx.commit().await?;

    find_by_id(pool, id).await?.ok_or_else(|| not_found(id))
}

pub async fn update(pool: &SqlitePool, id: i64, data: &EmployeeUpdate) -> RepoResult<Employee> {
    let rows = sqlx::query(
        "UPDATE employee SET \
            employee_code = COALESCE(?, employee_code), \
            full_name = COALESCE(?, full_name), \
            national_id = COALESCE(?, national_id), \
            department = COALESCE(?, department), \
            position = COALESCE(?, position), \
            phone = COALESCE(?, phone), \
            email = COALESCE(?, email), \
            hire_date = COALESCE(?, hire_date), \
            status = COALESCE(?, status), \
            updated_at = ? \
         WHERE id = ?",
    )
    .bind(data.employee_code.as_deref().map(str::trim))
    .bind(data.full_name.as_deref().map(str::trim))
    .bind(&data.national_id)
    .bind(&data.department)
    .bind(&data.position)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.hire_date)
    .bind(data.status)
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(pool)
    .await
    .map_err(map_duplicate)?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id));
    }
    find_by_id(pool, id).await?.ok_or_else(|| not_found(id))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM employee WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

// ── Salary defaults ──

pub async fn find_salary_default(
    conn: &mut SqliteConnection,
    employee_id: i64,
) -> RepoResult<Option<SalaryDefault>> {
    let row = sqlx::query_as::<_, SalaryDefault>(
        "SELECT employee_id, base_salary, allowances, deductions, updated_at \
         FROM employee_salary_default WHERE employee_id = ?",
    )
    .bind(employee_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

async fn upsert_salary_default_in(
    conn: &mut SqliteConnection,
    employee_id: i64,
    data: &SalaryDefaultInput,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO employee_salary_default (employee_id, base_salary, allowances, deductions, updated_at) \
         VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT (employee_id) DO UPDATE SET base_salary = excluded.base_salary, \
            allowances = excluded.allowances, deductions = excluded.deductions, \
            updated_at = excluded.updated_at",
    )
    .bind(employee_id)
    .bind(data.base_salary)
    .bind(data.allowances)
    .bind(data.deductions)
    .bind(shared::util::now_millis())
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn upsert_salary_default(
    pool: &SqlitePool,
    employee_id: i64,
    data: &SalaryDefaultInput,
) -> RepoResult<SalaryDefault> {
    let mut conn = pool.acquire().await?;
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM employee WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Err(not_found(employee_id));
    }
    upsert_salary_default_in(&mut conn, employee_id, data).await?;
    find_salary_default(&mut conn, employee_id)
        .await?
        .ok_or_else(|| not_found(employee_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    fn employee(code: &str, national_id: &str) -> EmployeeCreate {
        EmployeeCreate {
            employee_code: code.into(),
            full_name: format!("Employee {code}"),
            national_id: Some(national_id.into()),
            department: Some("Kitchen".into()),
            position: Some("Chef".into()),
            phone: None,
            email: None,
            hire_date: Some("2024-01-15".into()),
            status: EmployeeStatus::Active,
            salary_default: Some(SalaryDefaultInput {
                base_salary: 3000.0,
                allowances: 500.0,
                deductions: 0.0,
            }),
        }
    }

    #[tokio::test]
    async fn create_stores_salary_default() {
        let pool = DbService::memory().await.unwrap().pool;
        let created = create(&pool, &employee("E001", "1000")).await.unwrap();
        let defaults = created.salary_default.unwrap();
        assert_eq!(defaults.base_salary, 3000.0);
        assert_eq!(defaults.allowances, 500.0);
    }

    #[tokio::test]
    async fn duplicate_code_or_national_id_is_rejected() {
        let pool = DbService::memory().await.unwrap().pool;
        create(&pool, &employee("E001", "1000")).await.unwrap();
        let same_code = create(&pool, &employee("E001", "2000")).await.unwrap_err();
        assert!(matches!(same_code, RepoError::Business(ErrorCode::EmployeeCodeExists, _)));
        let same_id = create(&pool, &employee("E002", "1000")).await.unwrap_err();
        assert!(matches!(same_id, RepoError::Business(ErrorCode::EmployeeCodeExists, _)));
    }

    #[tokio::test]
    async fn status_filter() {
        let pool = DbService::memory().await.unwrap().pool;
        let e = create(&pool, &employee("E001", "1000")).await.unwrap();
        create(&pool, &employee("E002", "2000")).await.unwrap();
        update(
            &pool,
            e.id,
            &EmployeeUpdate {
                status: Some(EmployeeStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(find_all(&pool, Some(EmployeeStatus::Active)).await.unwrap().len(), 1);
        assert_eq!(find_all(&pool, None).await.unwrap().len(), 2);
    }
}
