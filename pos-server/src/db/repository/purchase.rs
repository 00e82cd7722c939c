//! Purchase invoice database operations
//!
//! Receiving a purchase raises raw material stock and moves its unit cost to
//! the weighted average; deleting it takes the stock back out (floored at 0).

use shared::ErrorCode;
use shared::models::{InvoiceType, PurchaseCreate, PurchaseInvoice, PurchaseItem};
use sqlx::SqlitePool;

use super::numbering::{self, DocumentKind};
use super::{RepoError, RepoResult, payment, raw_material};
use crate::billing::money;

const COLUMNS: &str = "id, invoice_number, supplier_name, invoice_date, branch_code, payment_method, \
    subtotal, tax_amount, discount_amount, total_amount, paid_amount, payment_status, notes, \
    created_by, created_at";

fn not_found(id: i64) -> RepoError {
    RepoError::business(ErrorCode::PurchaseNotFound, format!("Purchase invoice {id} not found"))
}

pub async fn find_all(
    pool: &SqlitePool,
    start_date: &str,
    end_date: &str,
) -> RepoResult<Vec<PurchaseInvoice>> {
    let rows = sqlx::query_as::<_, PurchaseInvoice>(&format!(
        "SELECT {COLUMNS} FROM purchase_invoice WHERE invoice_date >= ? AND invoice_date <= ? \
         ORDER BY invoice_date DESC, id DESC"
    ))
    .bind(start_date)
    .bind(end_date)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<PurchaseInvoice>> {
    let invoice = sqlx::query_as::<_, PurchaseInvoice>(&format!(
        "SELECT {COLUMNS} FROM purchase_invoice WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    let Some(mut invoice) = invoice else {
        return Ok(None);
    };
    invoice.items = sqlx::query_as::<_, PurchaseItem>(
        "SELECT id, raw_material_id, raw_material_name, quantity, unit_price, tax_amount, \
         discount_pct, discount_amount, line_total FROM purchase_item WHERE invoice_id = ? ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;
    Ok(Some(invoice))
}

/// Create a purchase invoice (`PUR-{year}-{seq}`) and receive its stock
pub async fn create(
    pool: &SqlitePool,
    data: &PurchaseCreate,
    invoice_date: &str,
    year: i32,
    vat_pct: f64,
    created_by: Option<i64>,
) -> RepoResult<PurchaseInvoice> {
    let mut tx = pool.begin().await?;

    let mut lines = Vec::with_capacity(data.items.len());
    for input in &data.items {
        let rm = raw_material::find_by_id_in(&mut tx, input.raw_material_id)
            .await?
            .ok_or_else(|| {
                RepoError::business(
                    ErrorCode::RawMaterialNotFound,
                    format!("Raw material {} not found", input.raw_material_id),
                )
            })?;
        let amounts = money::purchase_line(input.quantity, input.unit_price, vat_pct, input.discount_pct);
        lines.push((input, rm, amounts));
    }
    let totals = money::sum_lines(&lines.iter().map(|(_, _, a)| *a).collect::<Vec<_>>());

    let number = numbering::next_number(&mut tx, DocumentKind::Purchase, year).await?;
    let id = sqlx::query(
        "INSERT INTO purchase_invoice (invoice_number, supplier_name, invoice_date, branch_code, \
         payment_method, subtotal, tax_amount, discount_amount, total_amount, paid_amount, \
         payment_status, notes, created_by, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 'unpaid', ?, ?, ?)",
    )
    .bind(&number)
    .bind(&data.supplier_name)
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

    for (input, rm, amounts) in &lines {
        sqlx::query(
            "INSERT INTO purchase_item (invoice_id, raw_material_id, raw_material_name, quantity, \
             unit_price, tax_amount, discount_pct, discount_amount, line_total) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(rm.id)
        .bind(&rm.name)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(amounts.tax)
        .bind(input.discount_pct)
        .bind(amounts.discount)
        .bind(amounts.total)
        .execute(&mut *tx)
        .await?;

        // re-read: the same material may appear on several lines
        let current = raw_material::find_by_id_in(&mut tx, rm.id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Raw material {}", rm.id)))?;
        let new_cost = money::weighted_average_cost(
            current.cost_per_unit,
            current.stock_quantity,
            input.unit_price,
            input.quantity,
        );
        raw_material::adjust_stock(&mut tx, rm.id, input.quantity, Some(new_cost)).await?;
    }
    tx.commit().await?;

    tracing::info!(purchase_id = id, invoice_number = %number, total = totals.total, "Purchase invoice created");
    find_by_id(pool, id).await?.ok_or_else(|| not_found(id))
}

/// Delete a purchase, reverting its stock and removing its payments
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let invoice = find_by_id(pool, id).await?.ok_or_else(|| not_found(id))?;

    let mut tx = pool.begin().await?;
    for item in &invoice.items {
        raw_material::adjust_stock(&mut tx, item.raw_material_id, -item.quantity, None).await?;
    }
    payment::delete_for_invoice(&mut tx, InvoiceType::Purchase, id).await?;
    sqlx::query("DELETE FROM purchase_invoice WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(purchase_id = id, invoice_number = %invoice.invoice_number, "Purchase invoice deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::models::{PaymentMethod, PaymentStatus, PurchaseItemInput, RawMaterialCreate};

    async fn setup() -> (SqlitePool, i64) {
        let pool = DbService::memory().await.unwrap().pool;
        let rm = raw_material::create(
            &pool,
            &RawMaterialCreate {
                name: "Flour".into(),
                name_ar: None,
                unit: "kg".into(),
                cost_per_unit: 4.0,
                stock_quantity: 10.0,
                category: None,
            },
        )
        .await
        .unwrap();
        (pool, rm.id)
    }

    fn purchase(raw_material_id: i64, quantity: f64, unit_price: f64) -> PurchaseCreate {
        PurchaseCreate {
            supplier_name: Some("Al Marai".into()),
            invoice_date: None,
            branch_code: None,
            payment_method: PaymentMethod::Bank,
            notes: None,
            items: vec![PurchaseItemInput {
                raw_material_id,
                quantity,
                unit_price,
                discount_pct: 0.0,
            }],
        }
    }

    #[tokio::test]
    async fn create_receives_stock_at_weighted_cost() {
        let (pool, rm_id) = setup().await;
        let invoice = create(&pool, &purchase(rm_id, 10.0, 6.0), "2025-03-01", 2025, 15.0, None)
            .await
            .unwrap();

        assert_eq!(invoice.invoice_number, "PUR-2025-001");
        assert_eq!(invoice.subtotal, 60.0);
        assert_eq!(invoice.tax_amount, 9.0);
        assert_eq!(invoice.total_amount, 69.0);
        assert_eq!(invoice.payment_status, PaymentStatus::Unpaid);
        assert_eq!(invoice.items.len(), 1);

        let rm = raw_material::find_by_id(&pool, rm_id).await.unwrap().unwrap();
        assert_eq!(rm.stock_quantity, 20.0);
        assert_eq!(rm.cost_per_unit, 5.0);
    }

    #[tokio::test]
    async fn delete_reverts_stock_floored_at_zero() {
        let (pool, rm_id) = setup().await;
        let invoice = create(&pool, &purchase(rm_id, 5.0, 4.0), "2025-03-01", 2025, 15.0, None)
            .await
            .unwrap();

        // consume more than the purchase added
        raw_material::update(
            &pool,
            rm_id,
            &shared::models::RawMaterialUpdate {
                stock_quantity: Some(2.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        delete(&pool, invoice.id).await.unwrap();
        let rm = raw_material::find_by_id(&pool, rm_id).await.unwrap().unwrap();
        assert_eq!(rm.stock_quantity, 0.0);
        assert!(find_by_id(&pool, invoice.id).await.unwrap().is_none());
    }
}
