//! Payment database operations (sales, purchase, expense, salary)

use shared::models::{InvoiceType, Payment, PaymentMethod, PaymentStatus};
use sqlx::{SqliteConnection, SqlitePool};

use super::{RepoError, RepoResult};
use crate::billing::money;

const COLUMNS: &str =
    "id, invoice_type, invoice_id, amount, payment_method, paid_at, note, created_by, is_reversed";

/// New payment row
#[derive(Debug, Clone)]
pub struct NewPayment<'a> {
    pub invoice_type: InvoiceType,
    pub invoice_id: i64,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub note: Option<&'a str>,
    pub created_by: Option<i64>,
}

pub async fn insert(conn: &mut SqliteConnection, payment: &NewPayment<'_>) -> RepoResult<Payment> {
    let id = sqlx::query(
        "INSERT INTO payment (invoice_type, invoice_id, amount, payment_method, paid_at, note, created_by) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(payment.invoice_type)
    .bind(payment.invoice_id)
    .bind(money::round_money(payment.amount))
    .bind(payment.payment_method)
    .bind(shared::util::now_millis())
    .bind(payment.note)
    .bind(payment.created_by)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    sqlx::query_as::<_, Payment>(&format!("SELECT {COLUMNS} FROM payment WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create payment".into()))
}

pub async fn find_for_invoice(
    pool: &SqlitePool,
    invoice_type: InvoiceType,
    invoice_id: i64,
) -> RepoResult<Vec<Payment>> {
    let rows = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {COLUMNS} FROM payment WHERE invoice_type = ? AND invoice_id = ? ORDER BY paid_at, id"
    ))
    .bind(invoice_type)
    .bind(invoice_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Payments in `[from, to)` (millis), newest first
pub async fn find_in_range(
    pool: &SqlitePool,
    invoice_type: Option<InvoiceType>,
    from_millis: i64,
    to_millis: i64,
) -> RepoResult<Vec<Payment>> {
    let rows = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {COLUMNS} FROM payment \
         WHERE paid_at >= ? AND paid_at < ? AND (? IS NULL OR invoice_type = ?) \
         ORDER BY paid_at DESC, id DESC"
    ))
    .bind(from_millis)
    .bind(to_millis)
    .bind(invoice_type)
    .bind(invoice_type)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Sum of non-reversed payments for one document
pub async fn sum_active(
    conn: &mut SqliteConnection,
    invoice_type: InvoiceType,
    invoice_id: i64,
) -> RepoResult<f64> {
    let sum: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0.0) FROM payment \
         WHERE invoice_type = ? AND invoice_id = ? AND is_reversed = 0",
    )
    .bind(invoice_type)
    .bind(invoice_id)
    .fetch_one(conn)
    .await?;
    Ok(money::round_money(sum))
}

/// Mark every payment of a document as reversed
pub async fn reverse_for_invoice(
    conn: &mut SqliteConnection,
    invoice_type: InvoiceType,
    invoice_id: i64,
) -> RepoResult<u64> {
    let rows = sqlx::query(
        "UPDATE payment SET is_reversed = 1 WHERE invoice_type = ? AND invoice_id = ? AND is_reversed = 0",
    )
    .bind(invoice_type)
    .bind(invoice_id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected())
}

fn invoice_table(invoice_type: InvoiceType) -> Option<&'static str> {
    match invoice_type {
        InvoiceType::Sales => Some("sales_invoice"),
        InvoiceType::Purchase => Some("purchase_invoice"),
        InvoiceType::Expense => Some("expense_invoice"),
        InvoiceType::Salary => None,
    }
}

/// `(total_amount, paid_amount)` of an invoice, if it exists
pub async fn invoice_amounts(
    conn: &mut SqliteConnection,
    invoice_type: InvoiceType,
    invoice_id: i64,
) -> RepoResult<Option<(f64, f64)>> {
    let Some(table) = invoice_table(invoice_type) else {
        return Ok(None);
    };
    let row: Option<(f64, f64)> = sqlx::query_as(&format!(
        "SELECT total_amount, paid_amount FROM {table} WHERE id = ?"
    ))
    .bind(invoice_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Recompute paid amount and payment status of an invoice from its payments
pub async fn refresh_settlement(
    conn: &mut SqliteConnection,
    invoice_type: InvoiceType,
    invoice_id: i64,
) -> RepoResult<(f64, PaymentStatus)> {
    let table = invoice_table(invoice_type).ok_or_else(|| {
        RepoError::Validation("Salary settlement is tracked on the salary row".into())
    })?;
    let (total, _) = invoice_amounts(conn, invoice_type, invoice_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("{} invoice {invoice_id}", invoice_type.as_str())))?;
    let paid = sum_active(conn, invoice_type, invoice_id).await?;
    let status = money::settlement_status(paid, total);

    sqlx::query(&format!(
        "UPDATE {table} SET paid_amount = ?, payment_status = ? WHERE id = ?"
    ))
    .bind(paid)
    .bind(status)
    .bind(invoice_id)
    .execute(conn)
    .await?;
    Ok((paid, status))
}

pub async fn delete_for_invoice(
    conn: &mut SqliteConnection,
    invoice_type: InvoiceType,
    invoice_id: i64,
) -> RepoResult<()> {
    sqlx::query("DELETE FROM payment WHERE invoice_type = ? AND invoice_id = ?")
        .bind(invoice_type)
        .bind(invoice_id)
        .execute(conn)
        .await?;
    Ok(())
}
