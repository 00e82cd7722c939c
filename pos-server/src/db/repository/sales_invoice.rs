//! Sales invoice database operations

use shared::models::{PaymentMethod, PrintStatus, SalesInvoice, SalesInvoiceItem};
use sqlx::{SqliteConnection, SqlitePool};

use super::RepoResult;

const COLUMNS: &str = "id, invoice_number, invoice_date, branch_code, table_number, draft_id, \
    draft_version, customer_name, customer_phone, payment_method, subtotal, tax_pct, tax_amount, \
    discount_pct, discount_amount, total_amount, paid_amount, payment_status, print_status, \
    void_reason, created_by, created_at, confirmed_at, voided_at";

const ITEM_COLUMNS: &str = "id, invoice_id, meal_id, product_name, quantity, unit_price, \
    line_subtotal, tax_amount, discount_amount, line_total";

/// Header of a new invoice
#[derive(Debug, Clone)]
pub struct NewSalesInvoice {
    pub invoice_number: String,
    pub invoice_date: String,
    pub branch_code: String,
    pub table_number: Option<i64>,
    pub draft_id: Option<i64>,
    pub draft_version: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
    pub subtotal: f64,
    pub tax_pct: f64,
    pub tax_amount: f64,
    pub discount_pct: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
    pub created_by: Option<i64>,
}

/// Line snapshot of a new invoice
#[derive(Debug, Clone)]
pub struct NewSalesLine {
    pub meal_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub line_subtotal: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub line_total: f64,
}

/// Invoice list filter (dates are inclusive `YYYY-MM-DD`)
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub branch_code: Option<String>,
    pub print_status: Option<PrintStatus>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub async fn insert(
    conn: &mut SqliteConnection,
    invoice: &NewSalesInvoice,
    lines: &[NewSalesLine],
) -> RepoResult<i64> {
    let id = sqlx::query(
        "INSERT INTO sales_invoice (invoice_number, invoice_date, branch_code, table_number, draft_id, \
         draft_version, customer_name, customer_phone, payment_method, subtotal, tax_pct, tax_amount, \
         discount_pct, discount_amount, total_amount, paid_amount, payment_status, print_status, \
         created_by, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 'unpaid', 'pending', ?, ?)",
    )
    .bind(&invoice.invoice_number)
    .bind(&invoice.invoice_date)
    .bind(&invoice.branch_code)
    .bind(invoice.table_number)
    .bind(invoice.draft_id)
    .bind(invoice.draft_version)
    .bind(&invoice.customer_name)
    .bind(&invoice.customer_phone)
    .bind(invoice.payment_method)
    .bind(invoice.subtotal)
    .bind(invoice.tax_pct)
    .bind(invoice.tax_amount)
    .bind(invoice.discount_pct)
    .bind(invoice.discount_amount)
    .bind(invoice.total_amount)
    .bind(invoice.created_by)
    .bind(shared::util::now_millis())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    for line in lines {
        sqlx::query(
            "INSERT INTO sales_invoice_item (invoice_id, meal_id, product_name, quantity, unit_price, \
             line_subtotal, tax_amount, discount_amount, line_total) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(line.meal_id)
        .bind(&line.product_name)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.line_subtotal)
        .bind(line.tax_amount)
        .bind(line.discount_amount)
        .bind(line.line_total)
        .execute(&mut *conn)
        .await?;
    }
    Ok(id)
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<SalesInvoice>> {
    let row = sqlx::query_as::<_, SalesInvoice>(&format!(
        "SELECT {COLUMNS} FROM sales_invoice WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn find_items(pool: &SqlitePool, invoice_id: i64) -> RepoResult<Vec<SalesInvoiceItem>> {
    let rows = sqlx::query_as::<_, SalesInvoiceItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM sales_invoice_item WHERE invoice_id = ? ORDER BY id"
    ))
    .bind(invoice_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Latest pending invoice created from a draft
pub async fn find_pending_for_draft(
    conn: &mut SqliteConnection,
    draft_id: i64,
) -> RepoResult<Option<SalesInvoice>> {
    let row = sqlx::query_as::<_, SalesInvoice>(&format!(
        "SELECT {COLUMNS} FROM sales_invoice WHERE draft_id = ? AND print_status = 'pending' \
         ORDER BY id DESC LIMIT 1"
    ))
    .bind(draft_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn set_confirmed(conn: &mut SqliteConnection, id: i64) -> RepoResult<()> {
    sqlx::query(
        "UPDATE sales_invoice SET print_status = 'confirmed', confirmed_at = ? WHERE id = ?",
    )
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn set_void(conn: &mut SqliteConnection, id: i64, reason: Option<&str>) -> RepoResult<()> {
    sqlx::query(
        "UPDATE sales_invoice SET print_status = 'void', void_reason = ?, voided_at = ?, \
         paid_amount = 0, payment_status = 'unpaid' WHERE id = ?",
    )
    .bind(reason)
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Page of invoices, newest first, plus the total count
pub async fn list(
    pool: &SqlitePool,
    filter: &InvoiceFilter,
    offset: i64,
    limit: i64,
) -> RepoResult<(Vec<SalesInvoice>, i64)> {
    const WHERE: &str = "WHERE (?1 IS NULL OR branch_code = ?1) \
        AND (?2 IS NULL OR print_status = ?2) \
        AND (?3 IS NULL OR invoice_date >= ?3) \
        AND (?4 IS NULL OR invoice_date <= ?4)";

    let rows = sqlx::query_as::<_, SalesInvoice>(&format!(
        "SELECT {COLUMNS} FROM sales_invoice {WHERE} ORDER BY id DESC LIMIT ?5 OFFSET ?6"
    ))
    .bind(&filter.branch_code)
    .bind(filter.print_status)
    .bind(&filter.start_date)
    .bind(&filter.end_date)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM sales_invoice {WHERE}"))
        .bind(&filter.branch_code)
        .bind(filter.print_status)
        .bind(&filter.start_date)
        .bind(&filter.end_date)
        .fetch_one(pool)
        .await?;

    Ok((rows, total))
}
