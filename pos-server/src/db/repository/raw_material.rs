//! Raw material database operations

use shared::ErrorCode;
use shared::models::{RawMaterial, RawMaterialCreate, RawMaterialUpdate};
use sqlx::{SqliteConnection, SqlitePool};

use super::{RepoError, RepoResult};

const COLUMNS: &str = "id, name, name_ar, unit, cost_per_unit, stock_quantity, category, \
    is_active, created_at, updated_at";

fn not_found(id: i64) -> RepoError {
    RepoError::business(ErrorCode::RawMaterialNotFound, format!("Raw material {id} not found"))
}

pub async fn find_all(pool: &SqlitePool, include_inactive: bool) -> RepoResult<Vec<RawMaterial>> {
    let sql = if include_inactive {
        format!("SELECT {COLUMNS} FROM raw_material ORDER BY name")
    } else {
        format!("SELECT {COLUMNS} FROM raw_material WHERE is_active = 1 ORDER BY name")
    };
    let rows = sqlx::query_as::<_, RawMaterial>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<RawMaterial>> {
    let mut conn = pool.acquire().await?;
    find_by_id_in(&mut conn, id).await
}

pub async fn find_by_id_in(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<RawMaterial>> {
    let row = sqlx::query_as::<_, RawMaterial>(&format!(
        "SELECT {COLUMNS} FROM raw_material WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: &RawMaterialCreate) -> RepoResult<RawMaterial> {
    let now = shared::util::now_millis();
    let id = sqlx::query(
        "INSERT INTO raw_material \
         (name, name_ar, unit, cost_per_unit, stock_quantity, category, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(data.name.trim())
    .bind(&data.name_ar)
    .bind(data.unit.trim())
    .bind(data.cost_per_unit)
    .bind(data.stock_quantity)
    .bind(&data.category)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    find_by_id(pool, id).await?.ok_or_else(|| not_found(id))
}

pub async fn update(pool: &SqlitePool, id: i64, data: &RawMaterialUpdate) -> RepoResult<RawMaterial> {
    let rows = sqlx::query(
        "UPDATE raw_material SET \
            name = COALESCE(?, name), \
            name_ar = COALESCE(?, name_ar), \
            unit = COALESCE(?, unit), \
            cost_per_unit = COALESCE(?, cost_per_unit), \
            stock_quantity = COALESCE(?, stock_quantity), \
            category = COALESCE(?, category), \
            is_active = COALESCE(?, is_active), \
            updated_at = ? \
         WHERE id = ?",
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.name_ar)
    .bind(data.unit.as_deref().map(str::trim))
    .bind(data.cost_per_unit)
    .bind(data.stock_quantity)
    .bind(&data.category)
    .bind(data.is_active)
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id));
    }
    find_by_id(pool, id).await?.ok_or_else(|| not_found(id))
}

/// Delete; rejected while referenced by a meal or a purchase line
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let references: i64 = sqlx::query_scalar(
        "SELECT (SELECT COUNT(*) FROM meal_ingredient WHERE raw_material_id = ?1) \
              + (SELECT COUNT(*) FROM purchase_item WHERE raw_material_id = ?1)",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;
    if references > 0 {
        return Err(RepoError::business(
            ErrorCode::RawMaterialInUse,
            format!("Raw material {id} is used by {references} meal or purchase line(s)"),
        ));
    }

    let rows = sqlx::query("DELETE FROM raw_material WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Apply a stock delta and optionally set a new unit cost
///
/// Stock never drops below zero.
pub async fn adjust_stock(
    conn: &mut SqliteConnection,
    id: i64,
    delta: f64,
    new_cost: Option<f64>,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE raw_material SET \
            stock_quantity = MAX(0, stock_quantity + ?), \
            cost_per_unit = COALESCE(?, cost_per_unit), \
            updated_at = ? \
         WHERE id = ?",
    )
    .bind(delta)
    .bind(new_cost)
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Lowest stock first
pub async fn low_stock(pool: &SqlitePool, limit: i64) -> RepoResult<Vec<shared::models::LowStockItem>> {
    let rows = sqlx::query_as::<_, shared::models::LowStockItem>(
        "SELECT id, name, unit, stock_quantity FROM raw_material \
         WHERE is_active = 1 ORDER BY stock_quantity ASC, name LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    fn rice() -> RawMaterialCreate {
        RawMaterialCreate {
            name: "Rice".into(),
            name_ar: Some("أرز".into()),
            unit: "kg".into(),
            cost_per_unit: 4.0,
            stock_quantity: 10.0,
            category: None,
        }
    }

    #[tokio::test]
    async fn adjust_stock_floors_at_zero() {
        let pool = DbService::memory().await.unwrap().pool;
        let rm = create(&pool, &rice()).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        adjust_stock(&mut conn, rm.id, -25.0, None).await.unwrap();
        drop(conn);
        let rm = find_by_id(&pool, rm.id).await.unwrap().unwrap();
        assert_eq!(rm.stock_quantity, 0.0);
        assert_eq!(rm.cost_per_unit, 4.0);
    }

    #[tokio::test]
    async fn delete_missing_reports_not_found() {
        let pool = DbService::memory().await.unwrap().pool;
        let err = delete(&pool, 42).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::RawMaterialNotFound, _)));
    }
}
