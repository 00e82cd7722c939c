//! Expense invoice database operations
//!
//! Expenses are settled on entry: a payment for the full amount is recorded
//! together with the invoice.

use shared::ErrorCode;
use shared::models::{ExpenseCreate, ExpenseInvoice, ExpenseItem, InvoiceType};
use sqlx::SqlitePool;

use super::numbering::{self, DocumentKind};
use super::payment::{self, NewPayment};
use super::{RepoError, RepoResult};
use crate::billing::money;

const COLUMNS: &str = "id, invoice_number, invoice_date, branch_code, payment_method, subtotal, \
    tax_amount, discount_amount, total_amount, paid_amount, payment_status, notes, created_by, created_at";

fn not_found(id: i64) -> RepoError {
    RepoError::business(ErrorCode::ExpenseNotFound, format!("Expense invoice {id} not found"))
}

pub async fn find_all(
    pool: &SqlitePool,
    start_date: &str,
    end_date: &str,
) -> RepoResult<Vec<ExpenseInvoice>> {
    let rows = sqlx::query_as::<_, ExpenseInvoice>(&format!(
        "SELECT {COLUMNS} FROM expense_invoice WHERE invoice_date >= ? AND invoice_date <= ? \
         ORDER BY invoice_date DESC, id DESC"
    ))
    .bind(start_date)
    .bind(end_date)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<ExpenseInvoice>> {
    let invoice = sqlx::query_as::<_, ExpenseInvoice>(&format!(
        "SELECT {COLUMNS} FROM expense_invoice WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    let Some(mut invoice) = invoice else {
        return Ok(None);
    };
    invoice.items = sqlx::query_as::<_, ExpenseItem>(
        "SELECT id, description, quantity, unit_price, tax_amount, discount_pct, discount_amount, \
         line_total FROM expense_item WHERE invoice_id = ? ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;
    Ok(Some(invoice))
}

/// Create an expense invoice (`EXP-{year}-{seq}`), paid in full
pub async fn create(
    pool: &SqlitePool,
    data: &ExpenseCreate,
    invoice_date: &str,
    year: i32,
    created_by: Option<i64>,
) -> RepoResult<ExpenseInvoice> {
    let lines: Vec<_> = data
        .items
        .iter()
        .map(|i| (i, money::expense_line(i.quantity, i.unit_price, i.tax, i.discount_pct)))
        .collect();
    let totals = money::sum_lines(&lines.iter().map(|(_, a)| *a).collect::<Vec<_>>());

    let mut tx = pool.begin().await?;
    let number = numbering::next_number(&mut tx, DocumentKind::Expense, year).await?;
    let id = sqlx::query(
        "INSERT INTO expense_invoice (invoice_number, invoice_date, branch_code, payment_method, \
         subtotal, tax_amount, discount_amount, total_amount, paid_amount, payment_status, notes, \
         created_by, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, 'unpaid', ?, ?, ?)",
    )
    .bind(&number)
    .bind(invoice_date)
    .bind(&data.branch_code)
    .bind(data.payment_method)
    .bind(totals.subtotal)
    .bind(totals.tax)
    .bind(totals.discount)
    .bind(totals.total)
    .bind(&data.notes)
    .bind(created_by)
    .bind(shared::util::now_millis())
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    for (input, amounts) in &lines {
        sqlx::query(
            "INSERT INTO expense_item (invoice_id, description, quantity, unit_price, tax_amount, \
             discount_pct, discount_amount, line_total) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(input.description.trim())
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(amounts.tax)
        .bind(input.discount_pct)
        .bind(amounts.discount)
        .bind(amounts.total)
        .execute(&mut *tx)
        .await?;
    }

    if totals.total > 0.0 {
        payment::insert(
            &mut tx,
            &NewPayment {
                invoice_type: InvoiceType::Expense,
                invoice_id: id,
                amount: totals.total,
                payment_method: data.payment_method,
                note: Some(&number),
                created_by,
            },
        )
        .await?;
    }
    payment::refresh_settlement(&mut tx, InvoiceType::Expense, id).await?;
    tx.commit().await?;

    tracing::info!(expense_id = id, invoice_number = %number, total = totals.total, "Expense invoice created");
    find_by_id(pool, id).await?.ok_or_else(|| not_found(id))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let mut tx = pool.begin().await?;
    payment::delete_for_invoice(&mut tx, InvoiceType::Expense, id).await?;
    let rows = sqlx::query("DELETE FROM expense_invoice WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id));
    }
    tx.commit().await?;
    Ok(())
}
