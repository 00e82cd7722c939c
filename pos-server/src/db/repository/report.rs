//! Report queries (read-only)
//!
//! Dates are inclusive `YYYY-MM-DD` strings; payment timestamps are Unix
//! millis. Void sales invoices never count.

use shared::models::{BranchSales, CashFlow, DailySales, PaymentMethodCount, ReportRow, TopProduct};
use sqlx::SqlitePool;

use super::RepoResult;
use crate::billing::money;

/// Date range and optional branch of a report query
#[derive(Debug, Clone, Copy)]
pub struct DateScope<'a> {
    pub start_date: &'a str,
    pub end_date: &'a str,
    pub branch: Option<&'a str>,
}

pub async fn sales_by_branch(pool: &SqlitePool, scope: DateScope<'_>) -> RepoResult<Vec<BranchSales>> {
    let rows: Vec<(String, String, f64, i64)> = sqlx::query_as(
        "SELECT b.code, b.label, COALESCE(SUM(si.total_amount), 0.0), COUNT(si.id) \
         FROM branch b LEFT JOIN sales_invoice si ON si.branch_code = b.code \
            AND si.print_status != 'void' AND si.invoice_date BETWEEN ? AND ? \
         WHERE (? IS NULL OR b.code = ?) \
         GROUP BY b.code, b.label ORDER BY b.sort_order, b.code",
    )
    .bind(scope.start_date)
    .bind(scope.end_date)
    .bind(scope.branch)
    .bind(scope.branch)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(branch_code, label, total, invoice_count)| BranchSales {
            branch_code,
            label,
            total: money::round_money(total),
            invoice_count,
        })
        .collect())
}

pub async fn total_purchases(pool: &SqlitePool, scope: DateScope<'_>) -> RepoResult<f64> {
    let total: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(total_amount), 0.0) FROM purchase_invoice \
         WHERE invoice_date BETWEEN ? AND ? AND (? IS NULL OR branch_code = ?)",
    )
    .bind(scope.start_date)
    .bind(scope.end_date)
    .bind(scope.branch)
    .bind(scope.branch)
    .fetch_one(pool)
    .await?;
    Ok(money::round_money(total))
}

pub async fn total_expenses(pool: &SqlitePool, scope: DateScope<'_>) -> RepoResult<f64> {
    let total: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(total_amount), 0.0) FROM expense_invoice \
         WHERE invoice_date BETWEEN ? AND ? AND (? IS NULL OR branch_code = ?)",
    )
    .bind(scope.start_date)
    .bind(scope.end_date)
    .bind(scope.branch)
    .bind(scope.branch)
    .fetch_one(pool)
    .await?;
    Ok(money::round_money(total))
}

/// Salary totals of months whose first day falls inside the range
pub async fn total_salaries(pool: &SqlitePool, start_date: &str, end_date: &str) -> RepoResult<f64> {
    let total: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(total_salary), 0.0) FROM salary \
         WHERE printf('%04d-%02d-01', year, month) BETWEEN ? AND ?",
    )
    .bind(start_date)
    .bind(end_date)
    .fetch_one(pool)
    .await?;
    Ok(money::round_money(total))
}

pub async fn daily_sales(pool: &SqlitePool, scope: DateScope<'_>) -> RepoResult<Vec<DailySales>> {
    let rows = sqlx::query_as::<_, DailySales>(
        "SELECT invoice_date AS date, SUM(total_amount) AS total FROM sales_invoice \
         WHERE print_status != 'void' AND invoice_date BETWEEN ? AND ? \
            AND (? IS NULL OR branch_code = ?) \
         GROUP BY invoice_date ORDER BY invoice_date",
    )
    .bind(scope.start_date)
    .bind(scope.end_date)
    .bind(scope.branch)
    .bind(scope.branch)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn payment_methods(pool: &SqlitePool, scope: DateScope<'_>) -> RepoResult<Vec<PaymentMethodCount>> {
    let rows = sqlx::query_as::<_, PaymentMethodCount>(
        "SELECT payment_method, COUNT(*) AS count, SUM(total_amount) AS total FROM sales_invoice \
         WHERE print_status != 'void' AND invoice_date BETWEEN ? AND ? \
            AND (? IS NULL OR branch_code = ?) \
         GROUP BY payment_method ORDER BY count DESC, payment_method",
    )
    .bind(scope.start_date)
    .bind(scope.end_date)
    .bind(scope.branch)
    .bind(scope.branch)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Sales payments in, purchase/expense/salary payments out
pub async fn cash_flow(pool: &SqlitePool, from_millis: i64, to_millis: i64) -> RepoResult<CashFlow> {
    let rows: Vec<(String, f64)> = sqlx::query_as(
        "SELECT invoice_type, COALESCE(SUM(amount), 0.0) FROM payment \
         WHERE is_reversed = 0 AND paid_at >= ? AND paid_at < ? GROUP BY invoice_type",
    )
    .bind(from_millis)
    .bind(to_millis)
    .fetch_all(pool)
    .await?;

    let mut inflow = 0.0;
    let mut outflow = 0.0;
    for (kind, amount) in rows {
        match kind.as_str() {
            "sales" => inflow += amount,
            _ => outflow += amount,
        }
    }
    let inflow = money::round_money(inflow);
    let outflow = money::round_money(outflow);
    Ok(CashFlow {
        inflow,
        outflow,
        net: money::round_money(inflow - outflow),
    })
}

pub async fn top_products(pool: &SqlitePool, scope: DateScope<'_>, limit: i64) -> RepoResult<Vec<TopProduct>> {
    let rows = sqlx::query_as::<_, TopProduct>(
        "SELECT i.product_name, SUM(i.quantity) AS quantity, SUM(i.line_subtotal) AS revenue \
         FROM sales_invoice_item i JOIN sales_invoice si ON si.id = i.invoice_id \
         WHERE si.print_status != 'void' AND si.invoice_date BETWEEN ? AND ? \
            AND (? IS NULL OR si.branch_code = ?) \
         GROUP BY i.product_name ORDER BY quantity DESC, revenue DESC LIMIT ?",
    )
    .bind(scope.start_date)
    .bind(scope.end_date)
    .bind(scope.branch)
    .bind(scope.branch)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ── Tabular reports ──

pub async fn sales_rows(pool: &SqlitePool, scope: DateScope<'_>) -> RepoResult<Vec<ReportRow>> {
    let rows = sqlx::query_as::<_, ReportRow>(
        "SELECT id, invoice_number, invoice_date, branch_code, customer_name AS party, payment_method, \
            subtotal, tax_amount, discount_amount, total_amount, paid_amount, payment_status \
         FROM sales_invoice \
         WHERE print_status != 'void' AND invoice_date BETWEEN ? AND ? \
            AND (? IS NULL OR branch_code = ?) \
         ORDER BY invoice_date, id",
    )
    .bind(scope.start_date)
    .bind(scope.end_date)
    .bind(scope.branch)
    .bind(scope.branch)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn purchase_rows(pool: &SqlitePool, scope: DateScope<'_>) -> RepoResult<Vec<ReportRow>> {
    let rows = sqlx::query_as::<_, ReportRow>(
        "SELECT id, invoice_number, invoice_date, branch_code, supplier_name AS party, payment_method, \
            subtotal, tax_amount, discount_amount, total_amount, paid_amount, payment_status \
         FROM purchase_invoice \
         WHERE invoice_date BETWEEN ? AND ? AND (? IS NULL OR branch_code = ?) \
         ORDER BY invoice_date, id",
    )
    .bind(scope.start_date)
    .bind(scope.end_date)
    .bind(scope.branch)
    .bind(scope.branch)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn expense_rows(pool: &SqlitePool, scope: DateScope<'_>) -> RepoResult<Vec<ReportRow>> {
    let rows = sqlx::query_as::<_, ReportRow>(
        "SELECT id, invoice_number, invoice_date, branch_code, notes AS party, payment_method, \
            subtotal, tax_amount, discount_amount, total_amount, paid_amount, payment_status \
         FROM expense_invoice \
         WHERE invoice_date BETWEEN ? AND ? AND (? IS NULL OR branch_code = ?) \
         ORDER BY invoice_date, id",
    )
    .bind(scope.start_date)
    .bind(scope.end_date)
    .bind(scope.branch)
    .bind(scope.branch)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::{branch, sales_invoice};
    use shared::models::PaymentMethod;

    async fn invoice(pool: &SqlitePool, number: &str, date: &str, branch_code: &str, total: f64) -> i64 {
        let mut conn = pool.acquire().await.unwrap();
        sales_invoice::insert(
            &mut conn,
            &sales_invoice::NewSalesInvoice {
                invoice_number: number.into(),
                invoice_date: date.into(),
                branch_code: branch_code.into(),
                table_number: Some(1),
                draft_id: None,
                draft_version: None,
                customer_name: None,
                customer_phone: None,
                payment_method: PaymentMethod::Cash,
                subtotal: total,
                tax_pct: 0.0,
                tax_amount: 0.0,
                discount_pct: 0.0,
                discount_amount: 0.0,
                total_amount: total,
                created_by: None,
            },
            &[sales_invoice::NewSalesLine {
                meal_id: 1,
                product_name: "Kabsa".into(),
                quantity: 2,
                unit_price: total / 2.0,
                line_subtotal: total,
                tax_amount: 0.0,
                discount_amount: 0.0,
                line_total: total,
            }],
        )
        .await
        .unwrap()
    }

    async fn setup() -> SqlitePool {
        let pool = DbService::memory().await.unwrap().pool;
        branch::ensure(&pool, "china_town", "China Town", 0).await.unwrap();
        branch::ensure(&pool, "place_india", "Place India", 1).await.unwrap();
        pool
    }

    const MARCH: DateScope<'static> = DateScope {
        start_date: "2025-03-01",
        end_date: "2025-03-31",
        branch: None,
    };

    #[tokio::test]
    async fn void_invoices_are_excluded() {
        let pool = setup().await;
        invoice(&pool, "SAL-2025-001", "2025-03-02", "china_town", 100.0).await;
        let voided = invoice(&pool, "SAL-2025-002", "2025-03-02", "china_town", 40.0).await;
        invoice(&pool, "SAL-2025-003", "2025-03-05", "place_india", 60.0).await;
        invoice(&pool, "SAL-2025-004", "2025-04-01", "place_india", 999.0).await;
        {
            let mut conn = pool.acquire().await.unwrap();
            sales_invoice::set_void(&mut conn, voided, Some("wrong table")).await.unwrap();
        }

        let by_branch = sales_by_branch(&pool, MARCH).await.unwrap();
        assert_eq!(by_branch.len(), 2);
        assert_eq!(by_branch[0].branch_code, "china_town");
        assert_eq!(by_branch[0].total, 100.0);
        assert_eq!(by_branch[0].invoice_count, 1);
        assert_eq!(by_branch[1].total, 60.0);

        let daily = daily_sales(&pool, MARCH).await.unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(sales_rows(&pool, MARCH).await.unwrap().len(), 2);

        let top = top_products(&pool, MARCH, 10).await.unwrap();
        assert_eq!(top[0].quantity, 4);
        assert_eq!(top[0].revenue, 160.0);
    }

    #[tokio::test]
    async fn branch_filter_narrows_results() {
        let pool = setup().await;
        invoice(&pool, "SAL-2025-001", "2025-03-02", "china_town", 100.0).await;
        invoice(&pool, "SAL-2025-002", "2025-03-05", "place_india", 60.0).await;

        let scope = DateScope {
            branch: Some("place_india"),
            ..MARCH
        };
        let by_branch = sales_by_branch(&pool, scope).await.unwrap();
        assert_eq!(by_branch.len(), 1);
        assert_eq!(by_branch[0].total, 60.0);
        let methods = payment_methods(&pool, scope).await.unwrap();
        assert_eq!(methods[0].payment_method, "CASH");
        assert_eq!(methods[0].count, 1);
    }

    #[tokio::test]
    async fn empty_range_sums_to_zero() {
        let pool = setup().await;
        assert_eq!(total_purchases(&pool, MARCH).await.unwrap(), 0.0);
        assert_eq!(total_expenses(&pool, MARCH).await.unwrap(), 0.0);
        assert_eq!(total_salaries(&pool, "2025-03-01", "2025-03-31").await.unwrap(), 0.0);
        let flow = cash_flow(&pool, 0, i64::MAX).await.unwrap();
        assert_eq!(flow.net, 0.0);
    }
}
