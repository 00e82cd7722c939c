//! Draft order database operations
//!
//! At most one active (`open` / `checked_out`) draft per (branch, table),
//! enforced by a partial unique index.

use std::collections::HashMap;

use shared::models::{DraftItem, DraftOrder, DraftStatus};
use sqlx::{SqliteConnection, SqlitePool};

use super::RepoResult;

const COLUMNS: &str = "id, branch_code, table_number, customer_name, customer_phone, discount_pct, \
    tax_pct, payment_method, status, version, created_by, created_at, updated_at";

/// Header fields written on every save
#[derive(Debug, Clone, Default)]
pub struct DraftFields {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub discount_pct: f64,
    pub tax_pct: f64,
    pub payment_method: Option<String>,
}

/// Meal data needed to price a draft line
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MealPrice {
    pub id: i64,
    pub name: String,
    pub name_ar: Option<String>,
    pub price: f64,
    pub is_active: bool,
}

async fn load_items(conn: &mut SqliteConnection, draft_id: i64) -> RepoResult<Vec<DraftItem>> {
    let items = sqlx::query_as::<_, DraftItem>(
        "SELECT meal_id, product_name, unit_price, quantity, line_total \
         FROM draft_order_item WHERE draft_id = ? ORDER BY position",
    )
    .bind(draft_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

async fn with_items(conn: &mut SqliteConnection, draft: Option<DraftOrder>) -> RepoResult<Option<DraftOrder>> {
    match draft {
        Some(mut d) => {
            d.items = load_items(conn, d.id).await?;
            Ok(Some(d))
        }
        None => Ok(None),
    }
}

/// Active draft for a table, with items
pub async fn find_active(
    conn: &mut SqliteConnection,
    branch_code: &str,
    table_number: i64,
) -> RepoResult<Option<DraftOrder>> {
    let draft = sqlx::query_as::<_, DraftOrder>(&format!(
        "SELECT {COLUMNS} FROM draft_order \
         WHERE branch_code = ? AND table_number = ? AND status IN ('open', 'checked_out')"
    ))
    .bind(branch_code)
    .bind(table_number)
    .fetch_optional(&mut *conn)
    .await?;
    with_items(conn, draft).await
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<DraftOrder>> {
    let draft = sqlx::query_as::<_, DraftOrder>(&format!(
        "SELECT {COLUMNS} FROM draft_order WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    with_items(conn, draft).await
}

/// Resolve name, effective price and active flag for a set of meals
///
/// The effective price is the first menu listing's override, else the
/// meal's selling price.
pub async fn resolve_meals(
    conn: &mut SqliteConnection,
    meal_ids: &[i64],
) -> RepoResult<HashMap<i64, MealPrice>> {
    let mut resolved = HashMap::with_capacity(meal_ids.len());
    for id in meal_ids {
        let row = sqlx::query_as::<_, MealPrice>(
            "SELECT m.id, m.name, m.name_ar, \
                COALESCE((SELECT mi.price_override FROM menu_item mi \
                          WHERE mi.meal_id = m.id AND mi.price_override IS NOT NULL \
                          ORDER BY mi.id LIMIT 1), m.selling_price) AS price, \
                m.is_active \
             FROM meal m WHERE m.id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        if let Some(row) = row {
            resolved.insert(*id, row);
        }
    }
    Ok(resolved)
}

async fn write_items(conn: &mut SqliteConnection, draft_id: i64, items: &[DraftItem]) -> RepoResult<()> {
    sqlx::query("DELETE FROM draft_order_item WHERE draft_id = ?")
        .bind(draft_id)
        .execute(&mut *conn)
        .await?;
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO draft_order_item \
             (draft_id, meal_id, product_name, unit_price, quantity, line_total, position) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(draft_id)
        .bind(item.meal_id)
        .bind(&item.product_name)
        .bind(item.unit_price)
        .bind(item.quantity)
        .bind(item.line_total)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Insert a new open draft (version 1)
pub async fn insert(
    conn: &mut SqliteConnection,
    branch_code: &str,
    table_number: i64,
    fields: &DraftFields,
    items: &[DraftItem],
    created_by: Option<i64>,
) -> RepoResult<i64> {
    let now = shared::util::now_millis();
    let id = sqlx::query(
        "INSERT INTO draft_order (branch_code, table_number, customer_name, customer_phone, \
         discount_pct, tax_pct, payment_method, status, version, created_by, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, 'open', 1, ?, ?, ?)",
    )
    .bind(branch_code)
    .bind(table_number)
    .bind(&fields.customer_name)
    .bind(&fields.customer_phone)
    .bind(fields.discount_pct)
    .bind(fields.tax_pct)
    .bind(&fields.payment_method)
    .bind(created_by)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    write_items(conn, id, items).await?;
    Ok(id)
}

/// Overwrite header and lines, bumping the version
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    fields: &DraftFields,
    items: &[DraftItem],
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE draft_order SET customer_name = ?, customer_phone = ?, discount_pct = ?, \
         tax_pct = ?, payment_method = ?, version = version + 1, updated_at = ? WHERE id = ?",
    )
    .bind(&fields.customer_name)
    .bind(&fields.customer_phone)
    .bind(fields.discount_pct)
    .bind(fields.tax_pct)
    .bind(&fields.payment_method)
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(&mut *conn)
    .await?;
    write_items(conn, id, items).await
}

pub async fn set_status(conn: &mut SqliteConnection, id: i64, status: DraftStatus) -> RepoResult<()> {
    sqlx::query("UPDATE draft_order SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM draft_order WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Open drafts last touched before `before_millis`
pub async fn find_stale(pool: &SqlitePool, before_millis: i64) -> RepoResult<Vec<DraftOrder>> {
    let rows = sqlx::query_as::<_, DraftOrder>(&format!(
        "SELECT {COLUMNS} FROM draft_order WHERE status = 'open' AND updated_at < ? ORDER BY updated_at"
    ))
    .bind(before_millis)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
